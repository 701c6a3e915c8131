//! Shared focus/stack transition helpers used by the session store.

use desktop_app_contract::Pid;

use crate::model::SessionState;

/// Raises `pid` to the top of the stack and unhides it.
///
/// Returns `true` when the instance exists. Focus is not recomputed here; callers follow up with
/// [`recompute_focus`].
pub fn raise_instance(state: &mut SessionState, pid: Pid) -> bool {
    let Some(index) = state
        .open_instances
        .iter()
        .position(|instance| instance.pid == pid)
    else {
        return false;
    };

    let mut instance = state.open_instances.remove(index);
    instance.hidden = false;
    state.open_instances.push(instance);
    true
}

/// Recomputes the focused instance: the last non-hidden instance in stack order, if any.
///
/// This is the only place `focused` is written.
pub fn recompute_focus(state: &mut SessionState) -> Option<Pid> {
    state.focused = state
        .open_instances
        .iter()
        .rev()
        .find(|instance| !instance.hidden)
        .map(|instance| instance.pid);
    state.focused
}
