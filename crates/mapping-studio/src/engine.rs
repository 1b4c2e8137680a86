//! Interface to the external transformation engine.
//!
//! The engine runs off the UI thread and reports back through a stream of
//! [`EngineEvent`]s. The editor never blocks on it: the app drains pending
//! events once per frame and turns them into actions.

use mapping_model::MappingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EngineError {
    /// The engine ran out of memory or a similar resource. Surfaced with
    /// distinct guidance because the usual fix is a smaller input model.
    #[error("the transformation ran out of memory; try a smaller model file")]
    ResourceExhausted,
    #[error("transformation failed: {0}")]
    Failed(String),
}

impl EngineError {
    /// Classify a raw engine failure. Engines report resource exhaustion
    /// either with an explicit tag or only through the message text.
    pub fn from_report(error_type: Option<&str>, message: &str) -> Self {
        if error_type == Some("out_of_memory") {
            return EngineError::ResourceExhausted;
        }
        let lower = message.to_ascii_lowercase();
        if lower.contains("out of memory") || lower.contains("memory access out of bounds") {
            return EngineError::ResourceExhausted;
        }
        EngineError::Failed(message.to_string())
    }
}

/// Catalog-relevant discoveries made while the engine parses the input
/// model: custom grouping names on the source side, standard candidates on
/// the target side, and the entity classes available to filter nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub pset_sources: Vec<String>,
    pub pset_targets: Vec<String>,
    pub quantity_sources: Vec<String>,
    pub quantity_targets: Vec<String>,
    pub ifc_classes: Vec<String>,
}

/// Everything the engine reports back while a transformation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Intermediate progress, `percent` in 0..=100.
    Progress { percent: u8, message: String },
    /// Identifier lists discovered in the model. The editor replaces the
    /// pre-supplied node sets with them.
    ModelInfo(ModelInfo),
    /// The transformation finished; `output` names the produced file.
    Complete { output: String },
    Error { error: EngineError },
}

/// A transformation job: the input model plus the mapping to apply.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub input: PathBuf,
    pub config: MappingConfig,
}

#[cfg(not(target_arch = "wasm32"))]
pub use native_engine::{EngineHandle, command_backend, spawn};

#[cfg(not(target_arch = "wasm32"))]
mod native_engine {
    use super::{EngineError, EngineEvent, ModelInfo, TransformRequest};
    use serde::Deserialize;
    use std::io::{BufRead, BufReader, Write};
    use std::process::{Command, Stdio};
    use std::sync::mpsc::{Receiver, Sender, channel};

    /// Receiving end of a running transformation.
    pub struct EngineHandle {
        rx: Receiver<EngineEvent>,
    }

    impl EngineHandle {
        /// Drain every event the engine has produced since the last frame.
        pub fn poll(&self) -> Vec<EngineEvent> {
            self.rx.try_iter().collect()
        }
    }

    /// Run a transformation on a worker thread. The backend closure drives
    /// the actual engine and reports through the sender; a dropped sender
    /// simply ends the stream.
    pub fn spawn<F>(request: TransformRequest, backend: F) -> EngineHandle
    where
        F: FnOnce(TransformRequest, Sender<EngineEvent>) + Send + 'static,
    {
        let (tx, rx) = channel();
        std::thread::spawn(move || backend(request, tx));
        EngineHandle { rx }
    }

    /// One line of the engine's stdout protocol.
    #[derive(Deserialize)]
    struct RawReport {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        percent: Option<u8>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        pset_sources: Vec<String>,
        #[serde(default)]
        pset_targets: Vec<String>,
        #[serde(default)]
        quantity_sources: Vec<String>,
        #[serde(default)]
        quantity_targets: Vec<String>,
        #[serde(default)]
        ifc_classes: Vec<String>,
        #[serde(default)]
        output: Option<String>,
        #[serde(default)]
        error_type: Option<String>,
    }

    fn report_to_event(report: RawReport) -> Option<EngineEvent> {
        match report.kind.as_str() {
            "progress" => Some(EngineEvent::Progress {
                percent: report.percent.unwrap_or(0),
                message: report.message.unwrap_or_default(),
            }),
            "model_info" => Some(EngineEvent::ModelInfo(ModelInfo {
                pset_sources: report.pset_sources,
                pset_targets: report.pset_targets,
                quantity_sources: report.quantity_sources,
                quantity_targets: report.quantity_targets,
                ifc_classes: report.ifc_classes,
            })),
            "complete" => Some(EngineEvent::Complete {
                output: report.output.unwrap_or_default(),
            }),
            "error" => Some(EngineEvent::Error {
                error: EngineError::from_report(
                    report.error_type.as_deref(),
                    report.message.as_deref().unwrap_or("unknown engine error"),
                ),
            }),
            _ => None,
        }
    }

    /// Default backend: runs the `ifc-transform` executable, feeding the
    /// mapping configuration on stdin and reading one JSON report per
    /// stdout line.
    pub fn command_backend(request: TransformRequest, tx: Sender<EngineEvent>) {
        let fail = |tx: &Sender<EngineEvent>, message: String| {
            tx.send(EngineEvent::Error {
                error: EngineError::from_report(None, &message),
            })
            .ok();
        };

        let mut child = match Command::new("ifc-transform")
            .arg("--input")
            .arg(&request.input)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return fail(&tx, format!("could not start engine: {e}")),
        };

        if let Some(mut stdin) = child.stdin.take() {
            match serde_json::to_string(&request.config) {
                Ok(json) => {
                    if let Err(e) = stdin.write_all(json.as_bytes()) {
                        return fail(&tx, format!("could not send configuration: {e}"));
                    }
                }
                Err(e) => return fail(&tx, format!("could not encode configuration: {e}")),
            }
        }

        let Some(stdout) = child.stdout.take() else {
            return fail(&tx, "engine produced no output stream".to_string());
        };
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => return fail(&tx, format!("engine stream failed: {e}")),
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawReport>(&line) {
                Ok(report) => {
                    if let Some(event) = report_to_event(report) {
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => return fail(&tx, format!("unreadable engine report: {e}")),
            }
        }

        child.wait().ok();
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn model_info_reports_carry_all_identifier_lists() {
            let line = r#"{"type":"model_info","pset_sources":["Custom_Pset_1"],"quantity_targets":["Qto_WallBaseQuantities"],"ifc_classes":["IfcWall","IfcSlab"]}"#;
            let report: RawReport = serde_json::from_str(line).unwrap();
            match report_to_event(report) {
                Some(EngineEvent::ModelInfo(info)) => {
                    assert_eq!(info.pset_sources, vec!["Custom_Pset_1".to_string()]);
                    assert!(info.pset_targets.is_empty());
                    assert_eq!(info.quantity_targets, vec!["Qto_WallBaseQuantities".to_string()]);
                    assert_eq!(info.ifc_classes.len(), 2);
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_out_of_memory_is_resource_exhaustion() {
        let err = EngineError::from_report(Some("out_of_memory"), "allocation failed");
        assert_eq!(err, EngineError::ResourceExhausted);
    }

    #[test]
    fn untagged_memory_message_is_classified() {
        let err = EngineError::from_report(None, "RuntimeError: memory access out of bounds");
        assert_eq!(err, EngineError::ResourceExhausted);
    }

    #[test]
    fn other_failures_keep_their_message() {
        let err = EngineError::from_report(None, "invalid STEP header");
        assert_eq!(err, EngineError::Failed("invalid STEP header".into()));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn spawned_backend_events_arrive_in_order() {
        let request = TransformRequest {
            input: "model.ifc".into(),
            config: MappingConfig::new(),
        };
        let handle = spawn(request, |_, tx| {
            tx.send(EngineEvent::Progress {
                percent: 50,
                message: "converting".into(),
            })
            .ok();
            tx.send(EngineEvent::Complete {
                output: "model_mapped.ifc".into(),
            })
            .ok();
        });

        // The worker is short-lived; wait for it to finish sending.
        let mut events = Vec::new();
        for _ in 0..50 {
            events.extend(handle.poll());
            if events.len() == 2 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], EngineEvent::Progress { percent: 50, .. }));
        assert!(matches!(events[1], EngineEvent::Complete { .. }));
    }
}
