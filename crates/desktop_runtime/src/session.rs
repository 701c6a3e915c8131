//! Session store: the running-instance state machine.
//!
//! Every operation is synchronous and runs to completion before the next one starts, so no
//! operation can observe another's partial update. Lifecycle notifications go to injected
//! [`SessionListener`] observers after the state change they describe.

use std::rc::Rc;

use desktop_app_contract::{AppDescriptor, AppLifecycleEvent, Pid};
use platform_host::next_monotonic_timestamp_ms;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    error::RegistryError,
    model::{AppInstance, DockEntry, SessionState},
    registry::AppRegistry,
    window_manager::{raise_instance, recompute_focus},
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Lifecycle notification for one instance.
pub struct SessionEvent {
    pub pid: Pid,
    pub key: String,
    pub event: AppLifecycleEvent,
    /// Strictly increasing unix milliseconds.
    pub timestamp_ms: u64,
}

/// Observer for session lifecycle notifications.
pub trait SessionListener {
    fn on_event(&self, event: &SessionEvent);
}

impl<F> SessionListener for F
where
    F: Fn(&SessionEvent),
{
    fn on_event(&self, event: &SessionEvent) {
        self(event)
    }
}

/// Owner of [`SessionState`]. All mutation goes through its operations.
pub struct SessionStore {
    registry: Rc<AppRegistry>,
    state: SessionState,
    next_pid: u64,
    listeners: Vec<Rc<dyn SessionListener>>,
}

impl SessionStore {
    pub fn new(registry: Rc<AppRegistry>) -> Self {
        Self {
            registry,
            state: SessionState::default(),
            next_pid: 1,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Rc<dyn SessionListener>) {
        self.listeners.push(listener);
    }

    /// Read-only copy of the whole session state.
    pub fn view(&self) -> SessionState {
        self.state.clone()
    }

    pub fn instance(&self, pid: Pid) -> Option<AppInstance> {
        self.state.instance(pid).cloned()
    }

    pub fn instances(&self) -> Vec<AppInstance> {
        self.state.open_instances.clone()
    }

    pub fn dock(&self) -> Vec<DockEntry> {
        self.state.dock_instances.clone()
    }

    pub fn focused(&self) -> Option<AppInstance> {
        self.state.focused_instance().cloned()
    }

    pub fn launcher_visible(&self) -> bool {
        self.state.launcher_visible
    }

    fn allocate_pid(&mut self) -> Pid {
        let pid = Pid(self.next_pid);
        self.next_pid += 1;
        pid
    }

    fn emit(&self, pid: Pid, key: &str, event: AppLifecycleEvent) {
        debug!(%pid, key, event = event.token(), "session event");
        if self.listeners.is_empty() {
            return;
        }
        let event = SessionEvent {
            pid,
            key: key.to_string(),
            event,
            timestamp_ms: next_monotonic_timestamp_ms(),
        };
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }

    /// Recomputes focus and notifies the instances whose focus changed.
    fn refocus(&mut self) {
        let previous = self.state.focused;
        let next = recompute_focus(&mut self.state);
        if previous == next {
            return;
        }
        if let Some(instance) = previous.and_then(|pid| self.state.instance(pid)) {
            self.emit(instance.pid, instance.key(), AppLifecycleEvent::Blurred);
        }
        if let Some(instance) = next.and_then(|pid| self.state.instance(pid)) {
            self.emit(instance.pid, instance.key(), AppLifecycleEvent::Focused);
        }
    }

    /// Opens `descriptor`, or focuses its already-open instance.
    ///
    /// At most one instance per key is open at a time, singleton or not.
    pub fn open(&mut self, descriptor: &AppDescriptor) -> AppInstance {
        self.open_with(descriptor, Value::Null)
    }

    /// Like [`SessionStore::open`], recording launch parameters on a newly created instance.
    pub fn open_with(&mut self, descriptor: &AppDescriptor, launch_params: Value) -> AppInstance {
        if let Some(existing) = self.state.instance_by_key(&descriptor.key) {
            let (pid, was_hidden) = (existing.pid, existing.hidden);
            raise_instance(&mut self.state, pid);
            if was_hidden {
                self.emit(pid, &descriptor.key, AppLifecycleEvent::Shown);
            }
            self.refocus();
            debug!(%pid, key = descriptor.key.as_str(), "reused open instance");
            return self.instance(pid).unwrap_or_else(|| AppInstance {
                pid,
                descriptor: descriptor.clone(),
                hidden: false,
                launch_params: Value::Null,
            });
        }

        let pid = self.allocate_pid();
        let instance = AppInstance {
            pid,
            descriptor: descriptor.clone(),
            hidden: false,
            launch_params,
        };
        self.state.open_instances.push(instance.clone());

        match self
            .state
            .dock_instances
            .iter_mut()
            .find(|entry| entry.key() == descriptor.key)
        {
            Some(entry) => entry.pid = Some(pid),
            None if !descriptor.keep_in_dock => self.state.dock_instances.push(DockEntry {
                descriptor: descriptor.clone(),
                pid: Some(pid),
            }),
            None => {}
        }

        info!(%pid, key = descriptor.key.as_str(), "app opened");
        self.emit(pid, &descriptor.key, AppLifecycleEvent::Opened);
        self.refocus();
        instance
    }

    /// Opens a registered app by key.
    ///
    /// Unknown keys are an error and leave the session untouched.
    pub fn open_by_key(&mut self, key: &str) -> Result<AppInstance, RegistryError> {
        let descriptor = self
            .registry
            .get(key)
            .ok_or_else(|| RegistryError::UnknownApp {
                key: key.to_string(),
            })?;
        Ok(self.open(&descriptor))
    }

    /// Unhides and focuses `pid`. Unknown pids are ignored.
    pub fn show(&mut self, pid: Pid) -> SessionState {
        let Some(was_hidden) = self.state.instance(pid).map(|instance| instance.hidden) else {
            return self.view();
        };
        raise_instance(&mut self.state, pid);
        if was_hidden {
            if let Some(instance) = self.state.instance(pid) {
                self.emit(pid, instance.key(), AppLifecycleEvent::Shown);
            }
        }
        self.refocus();
        self.view()
    }

    /// Brings `pid` to the front, unhiding it if needed.
    pub fn focus(&mut self, pid: Pid) -> SessionState {
        self.show(pid)
    }

    /// Hides `pid` and moves focus to the last visible instance. Unknown pids are ignored.
    pub fn hide(&mut self, pid: Pid) -> SessionState {
        let Some(index) = self
            .state
            .open_instances
            .iter()
            .position(|instance| instance.pid == pid)
        else {
            return self.view();
        };
        let instance = &mut self.state.open_instances[index];
        if !instance.hidden {
            instance.hidden = true;
            let key = instance.key().to_string();
            self.emit(pid, &key, AppLifecycleEvent::Hidden);
        }
        self.refocus();
        self.view()
    }

    /// Closes `target`, matched by pid when still open, otherwise by key.
    ///
    /// Apps with `hide_when_close` are hidden instead. `keep_in_dock` apps keep their dock slot.
    pub fn close(&mut self, target: &AppInstance) -> SessionState {
        let index = self
            .state
            .open_instances
            .iter()
            .position(|instance| instance.pid == target.pid)
            .or_else(|| {
                self.state
                    .open_instances
                    .iter()
                    .position(|instance| instance.key() == target.key())
            });
        let Some(index) = index else {
            return self.view();
        };

        if self.state.open_instances[index].descriptor.hide_when_close {
            let pid = self.state.open_instances[index].pid;
            return self.hide(pid);
        }

        let closed = self.state.open_instances.remove(index);
        if closed.descriptor.keep_in_dock {
            for entry in &mut self.state.dock_instances {
                if entry.key() == closed.key() {
                    entry.pid = None;
                }
            }
        } else {
            self.state
                .dock_instances
                .retain(|entry| entry.key() != closed.key());
        }
        self.finish_close(&closed)
    }

    /// Removes the instance with `pid`. Unknown pids leave the session untouched.
    ///
    /// Unlike [`SessionStore::close`], this always removes the instance.
    pub fn close_by_pid(&mut self, pid: Pid) -> SessionState {
        let Some(index) = self
            .state
            .open_instances
            .iter()
            .position(|instance| instance.pid == pid)
        else {
            return self.view();
        };

        let closed = self.state.open_instances.remove(index);
        self.state
            .dock_instances
            .retain(|entry| entry.pid != Some(pid) || entry.descriptor.keep_in_dock);
        for entry in &mut self.state.dock_instances {
            if entry.pid == Some(pid) {
                entry.pid = None;
            }
        }
        self.finish_close(&closed)
    }

    fn finish_close(&mut self, closed: &AppInstance) -> SessionState {
        info!(pid = %closed.pid, key = closed.key(), "app closed");
        self.emit(closed.pid, closed.key(), AppLifecycleEvent::Closed);
        self.refocus();
        self.view()
    }

    /// Flips launcher visibility and returns the new value.
    pub fn toggle_launcher(&mut self) -> bool {
        self.state.launcher_visible = !self.state.launcher_visible;
        self.state.launcher_visible
    }

    /// Resets the dock to the registry's statically configured `keep_in_dock` apps.
    ///
    /// Open instances keep their dock slots: pinned entries pick up the running pid and open
    /// unpinned instances are appended in stack order.
    pub fn refresh_dock(&mut self) -> SessionState {
        let running_pid = |key: &str| {
            self.state
                .instance_by_key(key)
                .map(|instance| instance.pid)
        };
        let mut dock: Vec<DockEntry> = self
            .registry
            .dock_defaults()
            .into_iter()
            .map(|descriptor| DockEntry {
                pid: running_pid(&descriptor.key),
                descriptor,
            })
            .collect();
        for instance in &self.state.open_instances {
            if !dock.iter().any(|entry| entry.key() == instance.key()) {
                dock.push(DockEntry {
                    descriptor: instance.descriptor.clone(),
                    pid: Some(instance.pid),
                });
            }
        }
        debug!(entries = dock.len(), "dock refreshed");
        self.state.dock_instances = dock;
        self.view()
    }
}
