// src/core/orchestrator.rs

use crate::core::properties::PropertyStore;
use crate::core::selection::SelectionContext;
use crate::models::{Action, ActionKind, ActionState, ExecuteAction, SetPropertyAction};
use crate::system::executor::{LaunchError, LaunchRequest, ProcessLauncher, WaitMode};
use crate::system::registry::RegistryLookup;
use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;
use std::time::Duration;

/// External collaborators injected into a sequence run.
pub struct Services<'a> {
    pub registry: &'a dyn RegistryLookup,
    pub launcher: &'a dyn ProcessLauncher,
}

/// Aggregate result of one action sequence.
#[derive(Debug)]
pub struct SequenceReport {
    /// True when every required action succeeded.
    pub success: bool,
    /// Terminal state per action, in declaration order. Actions after an
    /// abort stay `Pending`.
    pub states: Vec<ActionState>,
}

/// Executes an ordered action sequence against one selection.
///
/// The selection's derived properties are registered first, then actions run
/// in declaration order. Each action's parameters are expanded against the
/// live store at its turn, so earlier actions' writes are visible to later
/// ones. A required action's failure stops the sequence immediately; a
/// best-effort failure is logged and skipped. There is no rollback: side
/// effects of already-executed actions stand.
pub fn execute_sequence(
    actions: &[Action],
    selection: &SelectionContext,
    store: &PropertyStore,
    services: &Services<'_>,
) -> SequenceReport {
    selection.register_properties(store);

    let mut states = vec![ActionState::Pending; actions.len()];
    for (i, action) in actions.iter().enumerate() {
        states[i] = ActionState::Executing;
        match execute_action(action, store, services) {
            Ok(()) => states[i] = ActionState::Succeeded,
            Err(e) => {
                states[i] = ActionState::Failed;
                if action.required {
                    log::error!("action {} failed, aborting sequence: {:#}", i, e);
                    return SequenceReport {
                        success: false,
                        states,
                    };
                }
                log::warn!("best-effort action {} failed, continuing: {:#}", i, e);
            }
        }
    }
    SequenceReport {
        success: true,
        states,
    }
}

fn execute_action(action: &Action, store: &PropertyStore, services: &Services<'_>) -> Result<()> {
    match &action.kind {
        ActionKind::SetProperty(set) => execute_set_property(set, store, services),
        ActionKind::Execute(exec) => execute_launch(exec, store, services),
    }
}

fn execute_set_property(
    action: &SetPropertyAction,
    store: &PropertyStore,
    services: &Services<'_>,
) -> Result<()> {
    let name = store
        .expand(&action.name)
        .with_context(|| format!("expanding property name '{}'", action.name))?;
    if name.is_empty() {
        return Err(anyhow!("property action has an empty name"));
    }

    match action.source.resolve(store, services.registry) {
        Ok(Some(value)) => {
            store.set(&name, &value);
            Ok(())
        }
        Ok(None) => {
            // The source named nothing; leave the property untouched.
            log::debug!("property '{}': no value to resolve, skipping", name);
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("resolving property '{}'", name)),
    }
}

fn execute_launch(
    action: &ExecuteAction,
    store: &PropertyStore,
    services: &Services<'_>,
) -> Result<()> {
    let path = store.expand(&action.path)?;
    let arguments = store.expand(&action.arguments)?;
    let working_dir = match &action.working_dir {
        Some(dir) => Some(PathBuf::from(store.expand(dir)?)),
        None => None,
    };

    let request = LaunchRequest {
        path,
        arguments,
        working_dir,
    };
    let wait = if action.wait {
        WaitMode::Wait {
            timeout: action.timeout_ms.map(Duration::from_millis),
            kill_on_timeout: action.kill_on_timeout,
        }
    } else {
        WaitMode::Detach
    };

    let record_pid = |pid: u32| -> Result<()> {
        if let Some(property) = &action.pid_property {
            let property = store.expand(property)?;
            store.set(&property, &pid.to_string());
        }
        Ok(())
    };

    match services.launcher.launch(&request, wait) {
        Ok(outcome) => record_pid(outcome.pid),
        Err(LaunchError::Timeout { command, pid }) => {
            // The child may still be running; keep it accounted for.
            record_pid(pid)?;
            Err(anyhow!(LaunchError::Timeout { command, pid }))
                .with_context(|| format!("launching '{}'", request.path))
        }
        Err(e) => Err(e).with_context(|| format!("launching '{}'", request.path)),
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueSource;
    use crate::system::executor::LaunchOutcome;
    use crate::system::registry::NoRegistry;
    use parking_lot::Mutex;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct FakeLauncher {
        requests: Mutex<Vec<(LaunchRequest, WaitMode)>>,
        fail: bool,
    }

    impl FakeLauncher {
        fn new(fail: bool) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail,
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    impl ProcessLauncher for FakeLauncher {
        fn launch(
            &self,
            request: &LaunchRequest,
            wait: WaitMode,
        ) -> Result<LaunchOutcome, LaunchError> {
            self.requests.lock().push((request.clone(), wait));
            if self.fail {
                Err(LaunchError::NonZeroExitStatus(request.path.clone()))
            } else {
                Ok(LaunchOutcome {
                    pid: 4242,
                    exit_code: Some(0),
                })
            }
        }
    }

    fn selection() -> SelectionContext {
        SelectionContext::new(vec![PathBuf::from("/tmp/report.txt")])
    }

    fn set_literal(name: &str, value: &str) -> ActionKind {
        ActionKind::SetProperty(SetPropertyAction {
            name: name.into(),
            source: ValueSource::Literal(value.into()),
        })
    }

    fn set_failing(name: &str) -> ActionKind {
        // min > max makes the random resolver fail deterministically.
        ActionKind::SetProperty(SetPropertyAction {
            name: name.into(),
            source: ValueSource::Random {
                min: "9".into(),
                max: "1".into(),
            },
        })
    }

    #[test]
    fn test_required_failure_aborts_sequence() {
        init_logs();
        let store = PropertyStore::new();
        let launcher = FakeLauncher::new(false);
        let services = Services {
            registry: &NoRegistry,
            launcher: &launcher,
        };
        let actions = [
            Action::required(set_literal("first", "1")),
            Action::required(set_failing("second")),
            Action::best_effort(set_literal("third", "3")),
        ];

        let report = execute_sequence(&actions, &selection(), &store, &services);

        assert!(!report.success);
        assert_eq!(
            report.states,
            vec![
                ActionState::Succeeded,
                ActionState::Failed,
                ActionState::Pending,
            ]
        );
        assert_eq!(store.get("first"), "1");
        // The third action never ran.
        assert!(!store.has("third"));
    }

    #[test]
    fn test_best_effort_failure_continues() {
        init_logs();
        let store = PropertyStore::new();
        let launcher = FakeLauncher::new(false);
        let services = Services {
            registry: &NoRegistry,
            launcher: &launcher,
        };
        let actions = [
            Action::best_effort(set_failing("first")),
            Action::required(set_literal("second", "2")),
        ];

        let report = execute_sequence(&actions, &selection(), &store, &services);

        assert!(report.success);
        assert_eq!(
            report.states,
            vec![ActionState::Failed, ActionState::Succeeded]
        );
        assert!(!store.has("first"));
        assert_eq!(store.get("second"), "2");
    }

    #[test]
    fn test_earlier_writes_visible_to_later_actions() {
        let store = PropertyStore::new();
        let launcher = FakeLauncher::new(false);
        let services = Services {
            registry: &NoRegistry,
            launcher: &launcher,
        };
        let actions = [
            Action::required(set_literal("build.target", "release")),
            Action::required(set_literal("build.banner", "mode=${build.target}")),
        ];

        let report = execute_sequence(&actions, &selection(), &store, &services);

        assert!(report.success);
        assert_eq!(store.get("build.banner"), "mode=release");
    }

    #[test]
    fn test_selection_properties_available_to_actions() {
        let store = PropertyStore::new();
        let launcher = FakeLauncher::new(false);
        let services = Services {
            registry: &NoRegistry,
            launcher: &launcher,
        };
        let actions = [Action::required(set_literal(
            "target",
            "${selection.filename}",
        ))];

        execute_sequence(&actions, &selection(), &store, &services);
        assert_eq!(store.get("target"), "report.txt");
    }

    #[test]
    fn test_execute_action_expands_and_records_pid() {
        let store = PropertyStore::new();
        store.set("viewer", "/usr/bin/viewer");
        let launcher = FakeLauncher::new(false);
        let services = Services {
            registry: &NoRegistry,
            launcher: &launcher,
        };
        let actions = [Action::required(ActionKind::Execute(ExecuteAction {
            path: "${viewer}".into(),
            arguments: "--open \"${selection.path}\"".into(),
            working_dir: Some("${selection.parent.path}".into()),
            wait: false,
            timeout_ms: None,
            kill_on_timeout: false,
            pid_property: Some("viewer.pid".into()),
        }))];

        let report = execute_sequence(&actions, &selection(), &store, &services);

        assert!(report.success);
        assert_eq!(store.get("viewer.pid"), "4242");
        let requests = launcher.requests.lock();
        let (request, wait) = &requests[0];
        assert_eq!(request.path, "/usr/bin/viewer");
        assert_eq!(request.arguments, "--open \"/tmp/report.txt\"");
        assert_eq!(request.working_dir.as_deref(), Some(std::path::Path::new("/tmp")));
        assert_eq!(*wait, WaitMode::Detach);
    }

    #[test]
    fn test_launch_failure_respects_required_flag() {
        let store = PropertyStore::new();
        let launcher = FakeLauncher::new(true);
        let services = Services {
            registry: &NoRegistry,
            launcher: &launcher,
        };
        let exec = ActionKind::Execute(ExecuteAction {
            path: "tool".into(),
            arguments: String::new(),
            working_dir: None,
            wait: true,
            timeout_ms: Some(1000),
            kill_on_timeout: false,
            pid_property: None,
        });

        let report = execute_sequence(
            &[Action::required(exec.clone())],
            &selection(),
            &store,
            &services,
        );
        assert!(!report.success);

        let report =
            execute_sequence(&[Action::best_effort(exec)], &selection(), &store, &services);
        assert!(report.success);
        assert_eq!(launcher.request_count(), 2);
    }

    #[test]
    fn test_skip_resolution_is_success_and_leaves_property_unset() {
        let store = PropertyStore::new();
        let launcher = FakeLauncher::new(false);
        let services = Services {
            registry: &NoRegistry,
            launcher: &launcher,
        };
        let actions = [Action::required(ActionKind::SetProperty(
            SetPropertyAction {
                name: "content".into(),
                source: ValueSource::File {
                    path: "${unset.path}".into(),
                    max_bytes: None,
                },
            },
        ))];

        let report = execute_sequence(&actions, &selection(), &store, &services);
        assert!(report.success);
        assert!(!store.has("content"));
    }

    #[test]
    fn test_empty_sequence_succeeds() {
        let store = PropertyStore::new();
        let launcher = FakeLauncher::new(false);
        let services = Services {
            registry: &NoRegistry,
            launcher: &launcher,
        };
        let report = execute_sequence(&[], &selection(), &store, &services);
        assert!(report.success);
        assert!(report.states.is_empty());
    }
}
