//! Node arena, connections and incremental evaluation.
//!
//! [`NodeGraph`] owns every node together with its cached output. Edits mark the edited node
//! and everything downstream of it dirty; evaluation recomputes only dirty ancestors of the
//! requested node, in topological order, each at most once per pass.
//!
//! Typical usage:
//! - build with [`NodeGraph::add_node`] and [`NodeGraph::connect`]
//! - evaluate with [`NodeGraph::evaluate`], or [`NodeGraph::evaluate_async`] plus
//!   [`NodeGraph::wait_for_completion`] to run noise and normal maps on worker threads
//! - read the final maps with [`NodeGraph::get_output_maps`]
use std::collections::{HashMap, HashSet};
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::compute::{compute_output, ComputeContext};
use super::node::NodeSpec;
use super::params::ParamValue;
use super::texture::TextureRegistry;
use super::worker::{Completion, Task, Workers};
use super::{MapValue, NodeId};
use crate::config::{GraphConfig, ResolutionMode};
use crate::error::{Error, Result};
use crate::kernels::CancelToken;
use crate::maps::{IntensityMap, VectorMap};

/// Lifecycle of a node's cached output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Output missing or stale.
    Dirty,
    /// Output being computed on a worker.
    Evaluating,
    /// Output cached and current.
    Clean,
    /// Last computation failed. Stays failed until the node is edited or invalidated.
    Failed,
}

/// Edge from the output of `from` into input slot `port` of `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    pub from: NodeId,
    pub to: NodeId,
    pub port: usize,
}

/// Counters for the most recent evaluation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Nodes computed on the calling thread.
    pub computed: usize,
    /// Clean nodes whose cached output was reused.
    pub reused: usize,
    /// Nodes handed to workers.
    pub submitted: usize,
}

/// Result of [`NodeGraph::evaluate_async`].
#[derive(Clone, Debug)]
pub enum Evaluation {
    Ready(MapValue),
    /// Worker jobs the requested node still depends on.
    Pending { waiting_on: Vec<NodeId> },
}

/// Maps exposed by the output node.
#[derive(Clone, Debug)]
pub struct OutputMaps {
    pub height: Arc<IntensityMap>,
    pub normal: Option<Arc<VectorMap>>,
}

#[derive(Debug)]
struct NodeEntry {
    spec: NodeSpec,
    /// Source node per input slot.
    inputs: Vec<Option<NodeId>>,
    state: NodeState,
    output: Option<MapValue>,
    failure: Option<String>,
    /// Bumped whenever the node becomes dirty. Worker results carry the version they were
    /// started with.
    version: u64,
}

impl NodeEntry {
    fn new(spec: NodeSpec) -> Self {
        let slots = spec.inputs().len();
        Self {
            spec,
            inputs: vec![None; slots],
            state: NodeState::Dirty,
            output: None,
            failure: None,
            version: 0,
        }
    }

    fn clean_output(&self) -> Option<&MapValue> {
        match self.state {
            NodeState::Clean => self.output.as_ref(),
            _ => None,
        }
    }
}

/// Terrain node graph with cached, incremental evaluation.
#[derive(Debug)]
pub struct NodeGraph {
    config: GraphConfig,
    nodes: Vec<Option<NodeEntry>>,
    output_node: Option<NodeId>,
    textures: TextureRegistry,
    workers: Workers,
    last_pass: PassStats,
    computed_total: u64,
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeGraph {
    /// Creates an empty graph with the default configuration.
    pub fn new() -> Self {
        Self {
            config: GraphConfig::default(),
            nodes: Vec::new(),
            output_node: None,
            textures: TextureRegistry::new(),
            workers: Workers::new(),
            last_pass: PassStats::default(),
            computed_total: 0,
        }
    }

    /// Creates an empty graph after validating `config`.
    pub fn with_config(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    /// Counters of the most recent [`evaluate`](Self::evaluate) or
    /// [`evaluate_async`](Self::evaluate_async) call.
    pub fn last_pass(&self) -> PassStats {
        self.last_pass
    }

    /// Node outputs produced since the graph was created, inline or on workers.
    pub fn total_computed(&self) -> u64 {
        self.computed_total
    }

    fn entry(&self, id: NodeId) -> Result<&NodeEntry> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownNode(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownNode(id))
    }

    fn entries(&self) -> impl Iterator<Item = (NodeId, &NodeEntry)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (NodeId::from_index(i), e)))
    }

    /// Adds a node. The first output node added becomes the designated output.
    pub fn add_node(&mut self, spec: NodeSpec) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        let is_output = matches!(spec, NodeSpec::Output);
        debug!("Adding node {} ({}).", id, spec.kind_name());
        self.nodes.push(Some(NodeEntry::new(spec)));
        if is_output && self.output_node.is_none() {
            self.output_node = Some(id);
        }
        id
    }

    /// Removes a node and every connection touching it. Returns its specification.
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeSpec> {
        self.entry(id)?;
        self.dirty_from(self.dependents_of(id));
        for entry in self.nodes.iter_mut().flatten() {
            for slot in entry.inputs.iter_mut() {
                if *slot == Some(id) {
                    *slot = None;
                }
            }
        }
        self.workers.cancel(id);
        if self.output_node == Some(id) {
            self.output_node = None;
        }
        let entry = self.nodes[id.index()]
            .take()
            .ok_or(Error::UnknownNode(id))?;
        debug!("Removed node {} ({}).", id, entry.spec.kind_name());
        Ok(entry.spec)
    }

    /// Connects the output of `from` to input slot `port` of `to`, replacing any existing
    /// connection on that slot. On error the graph is left unchanged.
    pub fn connect(&mut self, from: NodeId, to: NodeId, port: usize) -> Result<()> {
        let found = self.entry(from)?.spec.output_type();
        let target = self.entry(to)?;
        let slot = target
            .spec
            .inputs()
            .get(port)
            .ok_or(Error::InvalidPort { node: to, port })?;
        if slot.port_type != found {
            return Err(Error::TypeMismatch {
                expected: slot.port_type,
                found,
            });
        }
        if from == to || self.depends_on(from, to)? {
            return Err(Error::CycleRejected { from, to });
        }
        if target.inputs[port] == Some(from) {
            return Ok(());
        }
        self.entry_mut(to)?.inputs[port] = Some(from);
        debug!("Connected {} -> {} (port {}).", from, to, port);
        self.dirty_from(vec![to]);
        Ok(())
    }

    /// Clears input slot `port` of `to`, returning the node it was connected to.
    pub fn disconnect(&mut self, to: NodeId, port: usize) -> Result<Option<NodeId>> {
        let entry = self.entry_mut(to)?;
        let slot = entry
            .inputs
            .get_mut(port)
            .ok_or(Error::InvalidPort { node: to, port })?;
        let previous = slot.take();
        if let Some(from) = previous {
            debug!("Disconnected {} -> {} (port {}).", from, to, port);
            self.dirty_from(vec![to]);
        }
        Ok(previous)
    }

    /// `true` if `node` reads, directly or transitively, from `ancestor`.
    fn depends_on(&self, node: NodeId, ancestor: NodeId) -> Result<bool> {
        let mut seen = HashSet::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if id == ancestor {
                return Ok(true);
            }
            if seen.insert(id) {
                stack.extend(self.entry(id)?.inputs.iter().flatten().copied());
            }
        }
        Ok(false)
    }

    /// Sets a parameter by name and marks the node and its dependents dirty.
    pub fn set_parameter(&mut self, id: NodeId, name: &str, value: ParamValue) -> Result<()> {
        self.entry_mut(id)?.spec.set_parameter(name, value)?;
        debug!("Set parameter '{}' of node {}.", name, id);
        self.after_edit(id);
        Ok(())
    }

    /// Edits the specification of a node in place. The node kind must stay the same.
    pub fn edit_node(&mut self, id: NodeId, edit: impl FnOnce(&mut NodeSpec)) -> Result<()> {
        let entry = self.entry_mut(id)?;
        let mut spec = entry.spec.clone();
        edit(&mut spec);
        if mem::discriminant(&spec) != mem::discriminant(&entry.spec) {
            return Err(Error::invalid_parameter(
                "kind",
                format!(
                    "cannot change node {} from {} to {}",
                    id,
                    entry.spec.kind_name(),
                    spec.kind_name()
                ),
            ));
        }
        entry.inputs.resize(spec.inputs().len(), None);
        entry.spec = spec;
        debug!("Edited node {}.", id);
        self.after_edit(id);
        Ok(())
    }

    /// Dirties `id` and drops outgoing connections its new output type no longer satisfies.
    fn after_edit(&mut self, id: NodeId) {
        self.dirty_from(vec![id]);
        let Some(output_type) = self.entry(id).ok().map(|e| e.spec.output_type()) else {
            return;
        };
        for (index, slot) in self.nodes.iter_mut().enumerate() {
            let Some(entry) = slot else { continue };
            let slots = entry.spec.inputs();
            for (port, source) in entry.inputs.iter_mut().enumerate() {
                let mismatched = slots.get(port).is_some_and(|s| s.port_type != output_type);
                if *source == Some(id) && mismatched {
                    warn!(
                        "Dropping connection {} -> #{} (port {}): output type is now {}.",
                        id, index, port, output_type
                    );
                    *source = None;
                }
            }
        }
    }

    /// Marks a node and everything downstream of it dirty, e.g. to retry after a failure.
    pub fn invalidate(&mut self, id: NodeId) -> Result<()> {
        self.entry(id)?;
        debug!("Invalidating node {}.", id);
        self.dirty_from(vec![id]);
        Ok(())
    }

    /// Marks `roots` and their transitive dependents dirty, cancelling their worker jobs.
    fn dirty_from(&mut self, roots: Vec<NodeId>) {
        let mut seen = HashSet::new();
        let mut queue = roots;
        while let Some(id) = queue.pop() {
            if !seen.insert(id) {
                continue;
            }
            queue.extend(self.dependents_of(id));
            let Some(entry) = self.nodes.get_mut(id.index()).and_then(Option::as_mut) else {
                continue;
            };
            if entry.state == NodeState::Evaluating {
                self.workers.cancel(id);
            }
            entry.state = NodeState::Dirty;
            entry.output = None;
            entry.failure = None;
            entry.version += 1;
        }
    }

    /// Current state of a node.
    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.entry(id).ok().map(|e| e.state)
    }

    /// Cached output of a clean node.
    pub fn output(&self, id: NodeId) -> Option<MapValue> {
        self.entry(id).ok()?.clean_output().cloned()
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeSpec> {
        self.entry(id).ok().map(|e| &e.spec)
    }

    /// Reason of the last failure of a failed node.
    pub fn failure(&self, id: NodeId) -> Option<&str> {
        self.entry(id).ok()?.failure.as_deref()
    }

    pub fn version(&self, id: NodeId) -> Option<u64> {
        self.entry(id).ok().map(|e| e.version)
    }

    /// Source node per input slot.
    pub fn inputs_of(&self, id: NodeId) -> Option<&[Option<NodeId>]> {
        self.entry(id).ok().map(|e| e.inputs.as_slice())
    }

    /// Nodes reading the output of `id`, in id order.
    pub fn dependents_of(&self, id: NodeId) -> Vec<NodeId> {
        self.entries()
            .filter(|(_, e)| e.inputs.contains(&Some(id)))
            .map(|(to, _)| to)
            .collect()
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.entries()
            .flat_map(|(to, e)| {
                e.inputs.iter().enumerate().filter_map(move |(port, from)| {
                    from.map(|from| Connection { from, to, port })
                })
            })
            .collect()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Designates the node whose maps [`get_output_maps`](Self::get_output_maps) returns.
    pub fn set_output(&mut self, id: NodeId) -> Result<()> {
        let entry = self.entry(id)?;
        if !matches!(entry.spec, NodeSpec::Output) {
            return Err(Error::Other(format!(
                "node {} ({}) is not an output node",
                id,
                entry.spec.kind_name()
            )));
        }
        self.output_node = Some(id);
        Ok(())
    }

    pub fn output_node(&self) -> Option<NodeId> {
        self.output_node
    }

    /// Evaluates the output node and returns its height and normal maps.
    pub fn get_output_maps(&mut self) -> Result<OutputMaps> {
        let id = self.output_node.ok_or(Error::NoOutputNode)?;
        self.evaluate(id)?;
        self.output_maps_if_ready().ok_or_else(|| {
            Error::Other(format!("output node {id} is not clean after evaluation"))
        })
    }

    /// Output maps if the output node and its normal source are clean. Never computes.
    pub fn output_maps_if_ready(&self) -> Option<OutputMaps> {
        let entry = self.entry(self.output_node?).ok()?;
        let height = Arc::clone(entry.clean_output()?.as_intensity()?);
        let normal = match entry.inputs.get(1).copied().flatten() {
            Some(source) => Some(Arc::clone(
                self.entry(source).ok()?.clean_output()?.as_vector()?,
            )),
            None => None,
        };
        Some(OutputMaps { height, normal })
    }

    /// Registers an imported map and dirties the texture nodes reading `id`.
    pub fn register_texture(
        &mut self,
        id: impl Into<String>,
        map: impl Into<MapValue>,
    ) -> Option<MapValue> {
        let id = id.into();
        let previous = self.textures.register(id.clone(), map);
        self.invalidate_texture(&id);
        previous
    }

    pub fn unregister_texture(&mut self, id: &str) -> bool {
        let removed = self.textures.unregister(id);
        if removed {
            self.invalidate_texture(id);
        }
        removed
    }

    fn invalidate_texture(&mut self, texture_id: &str) {
        let readers: Vec<NodeId> = self
            .entries()
            .filter(|(_, e)| e.spec.texture_id() == Some(texture_id))
            .map(|(id, _)| id)
            .collect();
        debug!("Texture '{}' changed, {} reader(s) dirtied.", texture_id, readers.len());
        self.dirty_from(readers);
    }

    /// Switches between preview and render resolution. Every node becomes dirty.
    pub fn set_resolution_mode(&mut self, mode: ResolutionMode) {
        if self.config.mode == mode {
            return;
        }
        self.config.mode = mode;
        debug!(
            "Resolution mode {:?}, now {}.",
            mode,
            self.config.active_resolution()
        );
        let all: Vec<NodeId> = self.node_ids().collect();
        self.dirty_from(all);
    }

    /// Ancestors of `target` (inclusive) in topological order.
    fn plan(&self, target: NodeId) -> Result<Vec<NodeId>> {
        let mut members = HashSet::new();
        let mut stack = vec![target];
        while let Some(id) = stack.pop() {
            if members.insert(id) {
                stack.extend(self.entry(id)?.inputs.iter().flatten().copied());
            }
        }

        let mut indeg: HashMap<NodeId, usize> = HashMap::new();
        let mut dependents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for &id in &members {
            let inputs = &self.entry(id)?.inputs;
            indeg.insert(id, inputs.iter().flatten().count());
            for &input in inputs.iter().flatten() {
                dependents.entry(input).or_default().push(id);
            }
        }

        // Popped from the back, so the lowest id is taken first.
        let mut queue: Vec<NodeId> = indeg
            .iter()
            .filter_map(|(&id, &n)| (n == 0).then_some(id))
            .collect();
        queue.sort_unstable_by(|a, b| b.cmp(a));
        let mut order = Vec::with_capacity(members.len());
        while let Some(id) = queue.pop() {
            order.push(id);
            if let Some(children) = dependents.get(&id) {
                for child in children {
                    if let Some(n) = indeg.get_mut(child) {
                        *n = n.saturating_sub(1);
                        if *n == 0 {
                            queue.push(*child);
                        }
                    }
                }
            }
        }

        if order.len() != members.len() {
            return Err(Error::Other(format!(
                "cycle detected while planning node {target}"
            )));
        }
        Ok(order)
    }

    /// Evaluates `id` on the calling thread and returns its output.
    ///
    /// Clean ancestors are reused. Nodes with a worker job in flight are computed inline and
    /// their job result is later discarded.
    pub fn evaluate(&mut self, id: NodeId) -> Result<MapValue> {
        self.process_completions();
        let order = self.plan(id)?;
        let mut stats = PassStats::default();
        let outcome = self.run_pass(&order, false, &mut stats);
        self.last_pass = stats;
        outcome?;
        self.output(id)
            .ok_or_else(|| Error::Other(format!("node {id} is not clean after evaluation")))
    }

    /// Like [`evaluate`](Self::evaluate), but noise and normal map nodes run on worker threads.
    /// Returns [`Evaluation::Pending`] while any of them is still running.
    pub fn evaluate_async(&mut self, id: NodeId) -> Result<Evaluation> {
        self.process_completions();
        let order = self.plan(id)?;
        let mut stats = PassStats::default();
        let outcome = self.run_pass(&order, true, &mut stats);
        self.last_pass = stats;
        let waiting_on = outcome?;
        match self.output(id) {
            Some(value) => Ok(Evaluation::Ready(value)),
            None => Ok(Evaluation::Pending { waiting_on }),
        }
    }

    /// Runs one pass over `order`. Returns the worker jobs the pass is waiting on.
    fn run_pass(
        &mut self,
        order: &[NodeId],
        background: bool,
        stats: &mut PassStats,
    ) -> Result<Vec<NodeId>> {
        let cancel = CancelToken::new();
        let mut waiting_on = Vec::new();
        let mut blocked: HashSet<NodeId> = HashSet::new();

        for &id in order {
            let entry = self.entry(id)?;
            match entry.state {
                NodeState::Clean => {
                    stats.reused += 1;
                    continue;
                }
                NodeState::Failed => {
                    return Err(Error::EvaluationFailed {
                        node: id,
                        reason: entry.failure.clone().unwrap_or_default(),
                    });
                }
                NodeState::Evaluating if background => {
                    waiting_on.push(id);
                    blocked.insert(id);
                    continue;
                }
                NodeState::Evaluating => {
                    self.workers.cancel(id);
                    let entry = self.entry_mut(id)?;
                    entry.state = NodeState::Dirty;
                    entry.version += 1;
                }
                NodeState::Dirty => {}
            }

            let entry = self.entry(id)?;
            if entry.inputs.iter().flatten().any(|src| blocked.contains(src)) {
                blocked.insert(id);
                continue;
            }
            let inputs = match self.gather_inputs(id) {
                Ok(inputs) => inputs,
                Err(err) => return Err(self.fail(id, err)),
            };

            if background && entry.spec.runs_on_worker() {
                let task = Task::for_node(&entry.spec, &inputs, &self.config, &self.textures);
                match task {
                    Ok(Some(task)) => {
                        let version = entry.version;
                        self.workers.submit(id, version, task)?;
                        self.entry_mut(id)?.state = NodeState::Evaluating;
                        stats.submitted += 1;
                        waiting_on.push(id);
                        blocked.insert(id);
                        continue;
                    }
                    Ok(None) => {}
                    Err(err) => return Err(self.fail(id, err)),
                }
            }

            let ctx = ComputeContext::new(&self.config, &self.textures, &cancel);
            let outcome = compute_output(&entry.spec, &inputs, &ctx)
                .and_then(|value| value.size().check_limit(self.config.max_cells).map(|_| value));
            match outcome {
                Ok(value) => {
                    debug!("Computed node {} ({}).", id, entry.spec.kind_name());
                    self.store(id, value)?;
                    stats.computed += 1;
                }
                Err(err) => return Err(self.fail(id, err)),
            }
        }
        Ok(waiting_on)
    }

    /// Cached outputs of the sources of `id`, one per slot.
    fn gather_inputs(&self, id: NodeId) -> Result<Vec<Option<MapValue>>> {
        let entry = self.entry(id)?;
        let slots = entry.spec.inputs();
        let mut inputs = Vec::with_capacity(entry.inputs.len());
        for (port, source) in entry.inputs.iter().enumerate() {
            let value = match source {
                Some(source) => Some(
                    self.entry(*source)?
                        .clean_output()
                        .cloned()
                        .ok_or_else(|| Error::Other(format!("input {source} is not clean")))?,
                ),
                None => None,
            };
            if value.is_none() && slots.get(port).is_some_and(|s| s.required) {
                return Err(Error::MissingInput {
                    name: slots[port].name.to_owned(),
                });
            }
            inputs.push(value);
        }
        Ok(inputs)
    }

    fn store(&mut self, id: NodeId, value: MapValue) -> Result<()> {
        let entry = self.entry_mut(id)?;
        entry.state = NodeState::Clean;
        entry.output = Some(value);
        entry.failure = None;
        self.computed_total += 1;
        Ok(())
    }

    /// Marks `id` failed, dirties its dependents and returns the error to report.
    fn fail(&mut self, id: NodeId, err: Error) -> Error {
        let reason = err.to_string();
        warn!("Node {} failed: {}", id, reason);
        if let Ok(entry) = self.entry_mut(id) {
            entry.state = NodeState::Failed;
            entry.output = None;
            entry.failure = Some(reason.clone());
        }
        self.dirty_from(self.dependents_of(id));
        Error::EvaluationFailed { node: id, reason }
    }

    /// Applies finished worker results without blocking. Returns how many were applied.
    pub fn process_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.workers.try_recv() {
            if self.apply_completion(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Blocks until a worker result arrives or `timeout` passes, then applies every
    /// available result. Returns `false` on timeout or when no job is running.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> bool {
        if self.workers.is_idle() {
            return false;
        }
        match self.workers.recv_timeout(timeout) {
            Some(completion) => {
                self.apply_completion(completion);
                self.process_completions();
                true
            }
            None => false,
        }
    }

    /// `true` while any worker job is running.
    pub fn has_pending_work(&self) -> bool {
        !self.workers.is_idle()
    }

    /// Nodes with a worker job in flight, in id order.
    pub fn pending_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.workers.pending().collect();
        nodes.sort_unstable();
        nodes
    }

    fn apply_completion(&mut self, completion: Completion) -> bool {
        let Completion {
            node,
            version,
            outcome,
        } = completion;
        if matches!(outcome, Err(Error::Cancelled)) {
            debug!("Dropping cancelled job of node {} (version {}).", node, version);
            return false;
        }
        let current = match self.entry(node) {
            Ok(entry) if entry.state == NodeState::Evaluating && entry.version == version => entry,
            Ok(entry) => {
                warn!(
                    "Discarding superseded result of node {} (version {}, current {}).",
                    node, version, entry.version
                );
                return false;
            }
            Err(_) => {
                warn!("Discarding result of removed node {}.", node);
                return false;
            }
        };
        let expected = current.spec.output_type();
        let outcome = outcome.and_then(|value| {
            value.size().check_limit(self.config.max_cells)?;
            if value.port_type() != expected {
                return Err(Error::TypeMismatch {
                    expected,
                    found: value.port_type(),
                });
            }
            Ok(value)
        });
        match outcome {
            Ok(value) => {
                info!("Worker finished node {} (version {}).", node, version);
                self.store(node, value).is_ok()
            }
            Err(err) => {
                self.fail(node, err);
                true
            }
        }
    }
}
