use std::fs;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use desktop_app_contract::{AppDescriptor, AppModule, AppMountContext, MountedView, Pid};
use desktop_runtime::{
    AppRegistry, DesktopRuntime, ExecutionMode, RegistryError, Resolution, ResolveError,
    RuntimeConfig, StaticCatalog,
};
use futures::executor::{block_on, LocalPool};
use futures::future;
use futures::task::LocalSpawnExt;
use platform_host::{HostServices, LoadedModule, ManualTimerService, MemoryModuleSource};

fn mount_blank(context: AppMountContext) -> MountedView {
    MountedView {
        component: context.app_key,
        props: serde_json::Value::Null,
    }
}

fn module() -> LoadedModule {
    LoadedModule::new(AppModule::new(mount_blank))
}

fn app(key: &str, title: &str) -> AppDescriptor {
    AppDescriptor::new(key, title, key)
}

fn booted(statics: Vec<AppDescriptor>) -> DesktopRuntime {
    booted_with(RuntimeConfig::default(), statics, MemoryModuleSource::default())
}

fn booted_with(
    config: RuntimeConfig,
    statics: Vec<AppDescriptor>,
    source: MemoryModuleSource,
) -> DesktopRuntime {
    let mut runtime = DesktopRuntime::new(
        config,
        vec![StaticCatalog::Descriptors(statics)],
        HostServices::test(source, ManualTimerService::default()),
    )
    .expect("runtime");
    block_on(runtime.boot()).expect("boot");
    runtime
}

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("{prefix}_{}_{}", process::id(), nanos));
    fs::create_dir_all(&path).expect("create temp dir");
    path
}

#[test]
fn singleton_opened_twice_keeps_one_instance() {
    let mut calc = app("systemCalculator", "Calculator");
    calc.singleton = true;
    let mut runtime = booted(vec![calc]);
    let session = runtime.session_mut();

    let first = session.open_by_key("systemCalculator").expect("open");
    let second = session.open_by_key("systemCalculator").expect("reopen");

    assert_eq!(first.pid, second.pid);
    let matching = session
        .instances()
        .iter()
        .filter(|instance| instance.key() == "systemCalculator")
        .count();
    assert_eq!(matching, 1);
}

#[test]
fn hide_when_close_hides_and_keeps_dock_entry() {
    let mut terminal = app("systemTerminal", "Terminal");
    terminal.hide_when_close = true;
    let mut runtime = booted(vec![terminal]);
    let session = runtime.session_mut();

    let opened = session.open_by_key("systemTerminal").expect("open");
    let view = session.close(&opened);

    let instance = view.instance(opened.pid).expect("still open");
    assert!(instance.hidden);
    assert!(view.dock_entry("systemTerminal").is_some());
    assert_eq!(view.focused, None);
}

#[test]
fn hiding_the_only_visible_instance_clears_focus() {
    let mut runtime = booted(vec![app("a", "A")]);
    let session = runtime.session_mut();
    let a = session.open_by_key("a").expect("open");
    assert_eq!(session.view().focused, Some(a.pid));

    let view = session.hide(a.pid);
    assert_eq!(view.focused, None);
    assert!(session.focused().is_none());
}

#[test]
fn focus_skips_hidden_instances_in_recency_order() {
    let mut runtime = booted(vec![app("a", "A"), app("b", "B"), app("c", "C")]);
    let session = runtime.session_mut();
    let a = session.open_by_key("a").expect("a");
    let b = session.open_by_key("b").expect("b");
    let c = session.open_by_key("c").expect("c");

    assert_eq!(session.hide(b.pid).focused, Some(c.pid));
    let view = session.close(&c);
    assert_eq!(view.focused, Some(a.pid));
    assert!(view.instance(b.pid).expect("b open").hidden);
}

#[test]
fn register_then_get_returns_input_plus_defaults() {
    let runtime = booted(Vec::new());
    let mut input = app("demoClock", "Clock");
    input.author = Some("Desk Team".to_string());
    input.tags.insert("time".to_string());

    runtime.registry().register(input.clone()).expect("register");
    let stored = runtime.registry().get("demoClock").expect("stored");

    assert_eq!(stored.author, input.author);
    assert_eq!(stored.tags, input.tags);
    assert_eq!(stored.category.as_ref().map(|c| c.token()), Some("demo"));
    assert_eq!(stored.version.as_deref(), Some("1.0.0"));
    assert_eq!(stored.description.as_deref(), Some("Clock application"));
    let restored = AppDescriptor {
        category: None,
        version: None,
        description: None,
        ..stored
    };
    assert_eq!(restored, input);
}

#[test]
fn discovery_never_overwrites_static_keys() {
    let source = MemoryModuleSource::default();
    source.insert(
        "apps/custom/x.app",
        module().with_descriptor(app("X", "Discovered")),
    );
    let config = RuntimeConfig {
        mode: ExecutionMode::Development,
        ..RuntimeConfig::default()
    };
    let runtime = booted_with(config, vec![app("X", "Static")], source);

    assert_eq!(runtime.registry().get("X").expect("X").title, "Static");
    assert_eq!(runtime.registry().status().discovery.duplicates, 1);
}

#[test]
fn concurrent_resolution_triggers_exactly_one_load() {
    let source = MemoryModuleSource::default();
    source.insert("apps/custom/clock.app", module());
    let runtime = booted_with(
        RuntimeConfig::default(),
        vec![app("clock", "Clock")],
        source.clone(),
    );
    let descriptor = runtime.registry().get("clock").expect("clock");

    let first = runtime.registry().resolve_component(&descriptor);
    let second = runtime.registry().resolve_component(&descriptor);
    assert_eq!(second.resolution(), Resolution::Joined);
    let (a, b) = block_on(future::join(first, second));

    assert_eq!(a.expect("first").location, b.expect("second").location);
    assert_eq!(source.load_count("apps/custom/clock.app"), 1);
    assert_eq!(source.total_loads(), 1);
}

#[test]
fn search_matches_title_case_insensitively() {
    let runtime = booted(vec![
        app("systemCalculator", "Calculator"),
        app("systemNotepad", "Notepad"),
    ]);
    let found: Vec<String> = runtime
        .registry()
        .search("calc")
        .into_iter()
        .map(|descriptor| descriptor.key)
        .collect();
    assert_eq!(found, vec!["systemCalculator".to_string()]);
}

#[test]
fn close_by_unknown_pid_is_a_no_op() {
    let mut runtime = booted(vec![app("a", "A"), app("b", "B")]);
    let session = runtime.session_mut();
    session.open_by_key("a").expect("a");
    let b = session.open_by_key("b").expect("b");
    session.hide(b.pid);
    let before = session.view();

    let after = session.close_by_pid(Pid(4_242));
    assert_eq!(after, before);
}

#[test]
fn open_by_unknown_key_is_an_error_without_state_change() {
    let mut runtime = booted(vec![app("a", "A")]);
    let session = runtime.session_mut();
    let before = session.view();
    assert!(matches!(
        session.open_by_key("ghost"),
        Err(RegistryError::UnknownApp { .. })
    ));
    assert_eq!(session.view(), before);
}

#[test]
fn missing_components_fail_before_the_deadline() {
    let source = MemoryModuleSource::default();
    let timer = ManualTimerService::default();
    let mut config = RuntimeConfig::default();
    config.resolver.timeout_ms = 250;
    let registry = Rc::new(
        AppRegistry::new(
            config,
            vec![StaticCatalog::Descriptors(vec![app("ghost", "Ghost")])],
            Rc::new(source),
        )
        .expect("registry"),
    );
    block_on(registry.initialize()).expect("initialize");

    let outcome = Rc::new(std::cell::RefCell::new(None));
    let mut pool = LocalPool::new();
    {
        let registry = registry.clone();
        let timer = timer.clone();
        let outcome = outcome.clone();
        pool.spawner()
            .spawn_local(async move {
                let descriptor = registry.get("ghost").expect("ghost");
                let result = registry.resolve_component_within(&descriptor, &timer).await;
                *outcome.borrow_mut() = Some(result);
            })
            .expect("spawn");
    }
    pool.run_until_stalled();

    assert!(matches!(
        outcome.borrow().as_ref(),
        Some(Err(ResolveError::ComponentNotFound { .. }))
    ));
}

#[test]
fn runtime_config_file_drives_discovery() {
    let root = temp_dir("desktop_runtime_config");
    let path = root.join("runtime.toml");
    fs::write(
        &path,
        "[discovery]\ngate = \"always\"\nscan_paths = [\"plugins\"]\n",
    )
    .expect("write config");
    let config = RuntimeConfig::load(&path).expect("load config");

    let source = MemoryModuleSource::default();
    source.insert("plugins/tools/json-viewer.app", module());
    let runtime = booted_with(config, Vec::new(), source);

    let viewer = runtime
        .registry()
        .get("ToolsJsonViewer")
        .expect("discovered from configured root");
    assert_eq!(viewer.title, "Json Viewer");

    let _ = fs::remove_dir_all(root);
}
