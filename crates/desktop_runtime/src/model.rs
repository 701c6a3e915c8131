use desktop_app_contract::{AppDescriptor, AppMountContext, Pid};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A running occurrence of a descriptor.
///
/// `descriptor` is the snapshot taken at open time; everything else is instance-only state.
pub struct AppInstance {
    pub pid: Pid,
    pub descriptor: AppDescriptor,
    pub hidden: bool,
    /// Parameters supplied by whoever opened the instance.
    #[serde(default)]
    pub launch_params: Value,
}

impl AppInstance {
    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    /// Context handed to the app's mount function by the rendering layer.
    pub fn mount_context(&self) -> AppMountContext {
        AppMountContext {
            app_key: self.descriptor.key.clone(),
            pid: self.pid,
            launch_params: self.launch_params.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One dock slot. `pid` is set while an instance of the app is open.
pub struct DockEntry {
    pub descriptor: AppDescriptor,
    pub pid: Option<Pid>,
}

impl DockEntry {
    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    pub fn is_running(&self) -> bool {
        self.pid.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Running-instance state for one session.
///
/// Instances in `open_instances` are ordered oldest-focused first; the tail is the most recently
/// opened or focused. `focused` is derived from that order and never set independently.
pub struct SessionState {
    pub open_instances: Vec<AppInstance>,
    pub dock_instances: Vec<DockEntry>,
    pub focused: Option<Pid>,
    pub launcher_visible: bool,
}

impl SessionState {
    pub fn instance(&self, pid: Pid) -> Option<&AppInstance> {
        self.open_instances.iter().find(|instance| instance.pid == pid)
    }

    pub fn instance_by_key(&self, key: &str) -> Option<&AppInstance> {
        self.open_instances
            .iter()
            .find(|instance| instance.key() == key)
    }

    pub fn focused_instance(&self) -> Option<&AppInstance> {
        self.focused.and_then(|pid| self.instance(pid))
    }

    pub fn dock_entry(&self, key: &str) -> Option<&DockEntry> {
        self.dock_instances.iter().find(|entry| entry.key() == key)
    }
}
