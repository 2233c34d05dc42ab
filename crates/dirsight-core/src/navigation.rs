/// Navigation state machine — current path plus a back-history stack.
///
/// Every transition is validated before it is committed; a failed
/// transition leaves the state untouched. The controller never starts a
/// scan itself: a [`NavOutcome::Moved`] is the caller's cue to refresh.
use crate::error::NavError;
use crate::platform::{fs_root, Filesystem};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Current path and the paths visited before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub current_path: PathBuf,
    /// Oldest first; the top of the stack is the last element.
    pub history: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAction {
    /// Descend into a child directory.
    Enter(PathBuf),
    Up,
    Back,
    Home,
    Root,
    /// Jump to an arbitrary directory.
    ChangeTo(PathBuf),
}

/// Result of a navigation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// The current path changed.
    Moved(PathBuf),
    /// Nothing to do (already at the root, or the target is the current path).
    Stayed(PathBuf),
    /// `Back` with an empty history.
    AtTop(PathBuf),
}

impl NavOutcome {
    /// The current path after the action.
    pub fn path(&self) -> &Path {
        match self {
            Self::Moved(p) | Self::Stayed(p) | Self::AtTop(p) => p,
        }
    }

    pub fn moved(&self) -> bool {
        matches!(self, Self::Moved(_))
    }
}

pub struct NavigationController {
    fs: Arc<dyn Filesystem>,
    state: NavigationState,
    max_history: Option<usize>,
}

impl NavigationController {
    /// Start at `start` with an empty history. `start` is not validated;
    /// an unreadable start path simply scans as empty.
    pub fn new(fs: Arc<dyn Filesystem>, start: impl Into<PathBuf>, max_history: Option<usize>) -> Self {
        Self {
            fs,
            state: NavigationState {
                current_path: start.into(),
                history: Vec::new(),
            },
            max_history,
        }
    }

    pub fn current_path(&self) -> &Path {
        &self.state.current_path
    }

    pub fn history(&self) -> &[PathBuf] {
        &self.state.history
    }

    pub fn navigate(&mut self, action: NavAction) -> Result<NavOutcome, NavError> {
        match action {
            NavAction::Enter(path) => self.enter(path),
            NavAction::Up => Ok(self.go_up()),
            NavAction::Back => Ok(self.go_back()),
            NavAction::Home => self.jump_home(),
            NavAction::Root => Ok(self.jump_root()),
            NavAction::ChangeTo(path) => self.change_to(&path),
        }
    }

    /// Descend into `child`. Requires read access.
    pub fn enter(&mut self, child: impl Into<PathBuf>) -> Result<NavOutcome, NavError> {
        let child = normalize(&child.into());
        if !self.fs.has_read_access(&child) {
            debug!("Enter refused, no read access: {}", child.display());
            return Err(NavError::AccessDenied { path: child });
        }
        if !self.fs.is_dir(&child) {
            return Err(NavError::NotADirectory { path: child });
        }
        Ok(self.commit(child))
    }

    /// Move to the parent directory. A no-op at the filesystem root.
    pub fn go_up(&mut self) -> NavOutcome {
        match self.state.current_path.parent() {
            Some(parent) => {
                let parent = parent.to_path_buf();
                self.commit(parent)
            }
            None => NavOutcome::Stayed(self.state.current_path.clone()),
        }
    }

    /// Return to the previously visited path.
    pub fn go_back(&mut self) -> NavOutcome {
        match self.state.history.pop() {
            Some(previous) => {
                info!("Back to {}", previous.display());
                self.state.current_path = previous.clone();
                NavOutcome::Moved(previous)
            }
            None => NavOutcome::AtTop(self.state.current_path.clone()),
        }
    }

    pub fn jump_home(&mut self) -> Result<NavOutcome, NavError> {
        let home = self.fs.home_dir().ok_or(NavError::HomeUnavailable)?;
        Ok(self.commit(home))
    }

    /// Jump to the root of the filesystem containing the current path.
    pub fn jump_root(&mut self) -> NavOutcome {
        let root = fs_root(&self.state.current_path);
        self.commit(root)
    }

    /// Jump to an arbitrary directory. Relative paths are resolved against
    /// the current path; `.` and `..` are folded before validation.
    pub fn change_to(&mut self, path: &Path) -> Result<NavOutcome, NavError> {
        let target = normalize(&self.state.current_path.join(path));
        if !self.fs.is_dir(&target) {
            return Err(NavError::NotADirectory { path: target });
        }
        if !self.fs.has_read_access(&target) {
            return Err(NavError::AccessDenied { path: target });
        }
        Ok(self.commit(target))
    }

    fn commit(&mut self, target: PathBuf) -> NavOutcome {
        if target == self.state.current_path {
            return NavOutcome::Stayed(target);
        }
        let previous = std::mem::replace(&mut self.state.current_path, target.clone());
        self.state.history.push(previous);
        if let Some(cap) = self.max_history {
            if self.state.history.len() > cap {
                let excess = self.state.history.len() - cap;
                self.state.history.drain(..excess);
            }
        }
        info!("Navigated to {}", target.display());
        NavOutcome::Moved(target)
    }
}

/// Fold `.` and `..` lexically. `..` never climbs above the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.parent().is_some() {
                    out.pop();
                }
            }
            other => out.push(other),
        }
    }
    out
}
