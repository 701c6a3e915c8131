//! Built-in placeholder app implementations.
//!
//! Each mount function describes the view the rendering layer should draw; the real widgets live
//! on the rendering side.

use desktop_app_contract::{AppMountContext, MountedView};
use serde_json::json;

fn instance_props(context: &AppMountContext) -> serde_json::Value {
    json!({
        "appKey": context.app_key,
        "pid": context.pid.0,
        "launchParams": context.launch_params,
    })
}

pub(super) fn mount_calculator(context: AppMountContext) -> MountedView {
    let mut props = instance_props(&context);
    props["display"] = json!("0");
    props["memory"] = json!(null);
    MountedView {
        component: "calculator".to_string(),
        props,
    }
}

pub(super) fn mount_explorer(context: AppMountContext) -> MountedView {
    let mut props = instance_props(&context);
    let start = context
        .launch_params
        .get("path")
        .and_then(|path| path.as_str())
        .unwrap_or("/");
    props["cwd"] = json!(start);
    MountedView {
        component: "explorer".to_string(),
        props,
    }
}

pub(super) fn mount_notepad(context: AppMountContext) -> MountedView {
    let mut props = instance_props(&context);
    props["document"] = context
        .launch_params
        .get("document")
        .cloned()
        .unwrap_or_else(|| json!("Untitled"));
    MountedView {
        component: "notepad".to_string(),
        props,
    }
}

pub(super) fn mount_terminal(context: AppMountContext) -> MountedView {
    let mut props = instance_props(&context);
    props["prompt"] = json!("$ ");
    MountedView {
        component: "terminal".to_string(),
        props,
    }
}

pub(super) fn mount_settings(context: AppMountContext) -> MountedView {
    let mut props = instance_props(&context);
    props["section"] = context
        .launch_params
        .get("section")
        .cloned()
        .unwrap_or_else(|| json!("appearance"));
    MountedView {
        component: "settings".to_string(),
        props,
    }
}

/// Demo app without an embedded descriptor; discovery infers one from its location.
pub(super) fn mount_color_picker(context: AppMountContext) -> MountedView {
    let mut props = instance_props(&context);
    props["color"] = json!("#0b5fff");
    MountedView {
        component: "color-picker".to_string(),
        props,
    }
}
