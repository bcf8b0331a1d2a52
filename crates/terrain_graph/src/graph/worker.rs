//! Background jobs for the slow node kinds.
//!
//! Each job runs on its own named thread and reports back over a channel. The graph thread
//! drains completions and decides whether they still apply.
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};

use super::compute::{compute_output, ComputeContext};
use super::node::{CustomNode, NodeSpec};
use super::{MapValue, NodeId, PortType, TextureRegistry};
use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::kernels::noise::{self, NoiseParams};
use crate::kernels::normals::{self, NormalParams};
use crate::kernels::CancelToken;
use crate::maps::{IntensityMap, MapSize};

/// Self-contained work item. Owns everything it reads.
#[derive(Clone, Debug)]
pub(crate) enum Task {
    Noise {
        size: MapSize,
        params: NoiseParams,
    },
    Normals {
        heights: Arc<IntensityMap>,
        params: NormalParams,
    },
    /// Custom kind that opted into background evaluation. Carries snapshots of the config and
    /// texture registry; both are cheap to clone.
    Custom {
        node: CustomNode,
        inputs: Vec<Option<MapValue>>,
        config: GraphConfig,
        textures: TextureRegistry,
    },
}

impl Task {
    /// Builds the task for a worker kind, `Ok(None)` for every other kind.
    pub(crate) fn for_node(
        spec: &NodeSpec,
        inputs: &[Option<MapValue>],
        config: &GraphConfig,
        textures: &TextureRegistry,
    ) -> Result<Option<Self>> {
        match spec {
            NodeSpec::SimplexNoise { params } => Ok(Some(Task::Noise {
                size: config.active_resolution(),
                params: params.clone(),
            })),
            NodeSpec::NormalMap { params } => {
                let input = inputs.first().and_then(Option::as_ref).ok_or_else(|| {
                    Error::MissingInput {
                        name: "input".into(),
                    }
                })?;
                let heights = input.as_intensity().ok_or(Error::TypeMismatch {
                    expected: PortType::Intensity,
                    found: input.port_type(),
                })?;
                Ok(Some(Task::Normals {
                    heights: Arc::clone(heights),
                    params: params.clone(),
                }))
            }
            NodeSpec::Custom(node) if node.0.runs_on_worker() => Ok(Some(Task::Custom {
                node: node.clone(),
                inputs: inputs.to_vec(),
                config: config.clone(),
                textures: textures.clone(),
            })),
            _ => Ok(None),
        }
    }

    pub(crate) fn run(self, cancel: &CancelToken) -> Result<MapValue> {
        match self {
            Task::Noise { size, params } => Ok(noise::generate(size, &params, cancel)?.into()),
            Task::Normals { heights, params } => {
                Ok(normals::generate(&heights, &params, cancel)?.into())
            }
            Task::Custom {
                node,
                inputs,
                config,
                textures,
            } => {
                let ctx = ComputeContext::new(&config, &textures, cancel);
                compute_output(&NodeSpec::Custom(node), &inputs, &ctx)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

/// Result of one job, tagged with the node version it was computed for.
#[derive(Debug)]
pub(crate) struct Completion {
    pub node: NodeId,
    pub version: u64,
    pub outcome: Result<MapValue>,
}

#[derive(Debug)]
struct Job {
    version: u64,
    cancel: CancelToken,
}

/// Pool of one-shot worker threads keyed by node.
#[derive(Debug)]
pub(crate) struct Workers {
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    in_flight: HashMap<NodeId, Job>,
}

impl Default for Workers {
    fn default() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            in_flight: HashMap::new(),
        }
    }
}

impl Workers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Starts `task` for `node`, cancelling any older job of the same node.
    pub(crate) fn submit(&mut self, node: NodeId, version: u64, task: Task) -> Result<()> {
        self.cancel(node);
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let tx = self.tx.clone();
        thread::Builder::new()
            .name(format!("terrain-worker-{}", node.index()))
            .spawn(move || {
                // A panicking job still reports exactly one outcome.
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.run(&token)))
                    .unwrap_or_else(|payload| Err(Error::WorkerPanicked(panic_message(&*payload))));
                // The receiver lives as long as the graph; a send error means it was dropped.
                let _ = tx.send(Completion {
                    node,
                    version,
                    outcome,
                });
            })?;
        info!("Submitted node {} (version {}) to a worker.", node, version);
        self.in_flight.insert(node, Job { version, cancel });
        Ok(())
    }

    /// Cancels the job of `node`. Returns `true` if one was in flight.
    pub(crate) fn cancel(&mut self, node: NodeId) -> bool {
        match self.in_flight.remove(&node) {
            Some(job) => {
                job.cancel.cancel();
                debug!("Cancelled worker job of node {} (version {}).", node, job.version);
                true
            }
            None => false,
        }
    }

    pub(crate) fn cancel_all(&mut self) {
        for (_, job) in self.in_flight.drain() {
            job.cancel.cancel();
        }
    }

    /// Version of the job currently running for `node`.
    pub(crate) fn in_flight_version(&self, node: NodeId) -> Option<u64> {
        self.in_flight.get(&node).map(|job| job.version)
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub(crate) fn pending(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.in_flight.keys().copied()
    }

    pub(crate) fn try_recv(&mut self) -> Option<Completion> {
        let completion = self.rx.try_recv().ok()?;
        self.settle(&completion);
        Some(completion)
    }

    pub(crate) fn recv_timeout(&mut self, timeout: Duration) -> Option<Completion> {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.settle(&completion);
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn settle(&mut self, completion: &Completion) {
        if self.in_flight_version(completion.node) == Some(completion.version) {
            self.in_flight.remove(&completion.node);
        }
    }
}

impl Drop for Workers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
