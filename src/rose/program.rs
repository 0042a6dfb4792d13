use core::ops::Range;

use alloc::{sync::Arc, vec, vec::Vec};

use crate::{
    fdr::{self, PackedLiteralTable},
    rose::{error::BuildError, nfa::Nfa},
    util::{
        primitives::{LiteralID, PredID, QueueID, ReportID, RoleID},
        search::{GroupMask, ALL_GROUPS},
    },
};

/// A partially satisfied match waiting on a predicate before it reports.
#[derive(Clone, Debug)]
pub struct Role {
    report: ReportID,
    state: Option<usize>,
    simple_pred: bool,
    last_byte_history: bool,
}

impl Role {
    /// A role that fires `report`, with no state and a non-simple predicate.
    pub fn new(report: ReportID) -> Role {
        Role {
            report,
            state: None,
            simple_pred: false,
            last_byte_history: false,
        }
    }

    /// Set the index of the bit recording that this role is on. A role
    /// without state can still fire from the end-of-data iterator, but it
    /// cannot be switched on.
    pub fn state(mut self, index: Option<usize>) -> Role {
        self.state = index;
        self
    }

    /// When enabled, this role fires from the end-of-data iterator without
    /// evaluating any predicate.
    pub fn simple_pred(mut self, yes: bool) -> Role {
        self.simple_pred = yes;
        self
    }

    /// When enabled, this role only stays on while the last literal match
    /// ended at the current offset.
    pub fn last_byte_history(mut self, yes: bool) -> Role {
        self.last_byte_history = yes;
        self
    }

    /// The report fired by this role.
    pub fn get_report(&self) -> ReportID {
        self.report
    }

    /// The index of the state bit of this role, if it has one.
    pub fn get_state(&self) -> Option<usize> {
        self.state
    }

    /// Whether this role skips predicate evaluation.
    pub fn get_simple_pred(&self) -> bool {
        self.simple_pred
    }

    /// Whether this role's state is dropped when the last byte moves on.
    pub fn get_last_byte_history(&self) -> bool {
        self.last_byte_history
    }
}

/// The history a predicate requires of the current offset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum History {
    /// No requirement.
    None,
    /// The offset must fall in `min..=max`.
    Anchored {
        /// The smallest offset allowed.
        min: u64,
        /// The largest offset allowed.
        max: u64,
    },
    /// The predecessor must have been switched on at the last byte. Stale
    /// predecessors are dropped before any walk, so this always holds at
    /// check time.
    LastByte,
}

/// A history condition gating a role.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pred {
    history: History,
}

impl Pred {
    /// Create a predicate with the given history requirement.
    pub fn new(history: History) -> Pred {
        Pred { history }
    }

    /// The history requirement of this predicate.
    pub fn history(&self) -> History {
        self.history
    }

    /// Returns true if a role gated by this predicate may fire at `offset`.
    pub fn check(&self, offset: u64) -> bool {
        match self.history {
            History::None | History::LastByte => true,
            History::Anchored { min, max } => min <= offset && offset <= max,
        }
    }
}

/// A role reachable from a role state bit in the end-of-data iterator,
/// together with the predicate it is checked against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EodIterRole {
    /// The role to fire.
    pub role: RoleID,
    /// Its predicate. Roles with a simple predicate need none.
    pub pred: Option<PredID>,
}

/// The roles to consider when one role state bit is on.
#[derive(Clone, Debug)]
pub(crate) struct IterMapping {
    pub(crate) state: usize,
    pub(crate) roles: Vec<EodIterRole>,
}

/// The work to do when a literal matches.
///
/// Programs drive both the synthetic end-of-data event and every match of
/// the end-anchored literal matcher.
#[derive(Clone, Debug)]
pub struct LiteralProgram {
    delay: u32,
    groups: GroupMask,
    eod_only: bool,
    reports: Vec<ReportID>,
    roles: Vec<RoleID>,
    suffixes: Vec<QueueID>,
    squash: GroupMask,
}

impl Default for LiteralProgram {
    fn default() -> LiteralProgram {
        LiteralProgram {
            delay: 0,
            groups: ALL_GROUPS,
            eod_only: false,
            reports: vec![],
            roles: vec![],
            suffixes: vec![],
            squash: 0,
        }
    }
}

impl LiteralProgram {
    /// An empty program that runs whatever groups are live.
    pub fn new() -> LiteralProgram {
        LiteralProgram::default()
    }

    /// Defer the program until `delay` bytes after the end of the match.
    pub fn delay(mut self, delay: u32) -> LiteralProgram {
        self.delay = delay;
        self
    }

    /// Only run when one of these groups is live.
    pub fn groups(mut self, groups: GroupMask) -> LiteralProgram {
        self.groups = groups;
        self
    }

    /// Only run when the match ends exactly at end-of-data.
    pub fn eod_only(mut self, yes: bool) -> LiteralProgram {
        self.eod_only = yes;
        self
    }

    /// Fire a report at the end of the match.
    pub fn report(mut self, report: ReportID) -> LiteralProgram {
        self.reports.push(report);
        self
    }

    /// Switch a role on.
    pub fn role(mut self, role: RoleID) -> LiteralProgram {
        self.roles.push(role);
        self
    }

    /// Trigger a suffix sub-automaton at the end of the match.
    pub fn suffix(mut self, queue: QueueID) -> LiteralProgram {
        self.suffixes.push(queue);
        self
    }

    /// Switch these groups off after running.
    pub fn squash(mut self, groups: GroupMask) -> LiteralProgram {
        self.squash = groups;
        self
    }

    pub(crate) fn get_delay(&self) -> u32 {
        self.delay
    }

    pub(crate) fn get_groups(&self) -> GroupMask {
        self.groups
    }

    pub(crate) fn get_eod_only(&self) -> bool {
        self.eod_only
    }

    pub(crate) fn reports(&self) -> &[ReportID] {
        &self.reports
    }

    pub(crate) fn roles(&self) -> &[RoleID] {
        &self.roles
    }

    pub(crate) fn suffixes(&self) -> &[QueueID] {
        &self.suffixes
    }

    pub(crate) fn get_squash(&self) -> GroupMask {
        self.squash
    }
}

/// A byte that switches a role on wherever it occurs, while any of its
/// groups is live.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SidecarTrigger {
    /// The byte to look for.
    pub byte: u8,
    /// The role to switch on.
    pub role: RoleID,
    /// The groups enabling this trigger.
    pub groups: GroupMask,
}

/// The sub-automaton behind one queue and where its state lives.
#[derive(Clone, Debug)]
pub(crate) struct NfaInfo {
    pub(crate) nfa: Arc<dyn Nfa>,
    pub(crate) stream: Range<usize>,
    pub(crate) full: Range<usize>,
}

/// A literal table scanning the tail of the data for matches that must end
/// at or near end-of-data.
#[derive(Clone, Debug)]
pub(crate) struct EodMatcher {
    pub(crate) table: PackedLiteralTable<Vec<u8>>,
    /// The length of the shortest literal. Less data than this cannot
    /// produce a match.
    pub(crate) min_width: usize,
    /// Only this many bytes at the end of the data are scanned.
    pub(crate) region_size: usize,
}

/// A compiled Rose program, as far as the end-of-data pass needs it.
///
/// A program is immutable once built and may be shared by any number of
/// concurrent scans, each with its own [`State`](crate::rose::State) and
/// [`Scratch`](crate::rose::Scratch).
#[derive(Clone, Debug)]
pub struct RoseEngine {
    pub(crate) roles: Vec<Role>,
    pub(crate) preds: Vec<Pred>,
    pub(crate) num_role_states: usize,
    pub(crate) eod_iter: Vec<IterMapping>,
    pub(crate) programs: Vec<Option<LiteralProgram>>,
    pub(crate) eod_event: Option<LiteralID>,
    pub(crate) nfas: Vec<NfaInfo>,
    pub(crate) stream_state_len: usize,
    pub(crate) full_state_len: usize,
    pub(crate) ematcher: Option<EodMatcher>,
    pub(crate) sidecar: Vec<SidecarTrigger>,
    pub(crate) last_byte_states: Vec<usize>,
    pub(crate) max_bi_anchored_width: Option<u64>,
    pub(crate) initial_groups: GroupMask,
    pub(crate) requires_eod_side_catchup: bool,
}

impl RoseEngine {
    /// Create a builder for a new program.
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// The number of roles.
    pub fn num_roles(&self) -> usize {
        self.roles.len()
    }

    /// The number of role state bits persisted per stream.
    pub fn num_role_states(&self) -> usize {
        self.num_role_states
    }

    /// The number of sub-automaton queues.
    pub fn num_queues(&self) -> usize {
        self.nfas.len()
    }

    /// The role with the given id.
    pub fn role(&self, id: RoleID) -> &Role {
        &self.roles[id]
    }

    /// The sub-automaton behind the given queue.
    pub fn nfa(&self, queue: QueueID) -> &Arc<dyn Nfa> {
        &self.nfas[queue].nfa
    }

    /// The total length of the compressed sub-automaton state persisted per
    /// stream.
    pub fn stream_state_len(&self) -> usize {
        self.stream_state_len
    }

    /// The total length of the full sub-automaton state in scratch space.
    pub fn full_state_len(&self) -> usize {
        self.full_state_len
    }

    /// The maximum offset at which a match anchored at both ends is
    /// possible, or `None` if unbounded.
    pub fn max_bi_anchored_width(&self) -> Option<u64> {
        self.max_bi_anchored_width
    }

    /// The group set a stream starts with.
    pub fn initial_groups(&self) -> GroupMask {
        self.initial_groups
    }

    /// Whether the block-mode pass catches up the sidecar over the whole
    /// buffer before starting.
    pub fn requires_eod_side_catchup(&self) -> bool {
        self.requires_eod_side_catchup
    }

    /// The end-anchored literal table, if any.
    pub fn eod_matcher(&self) -> Option<&PackedLiteralTable<Vec<u8>>> {
        self.ematcher.as_ref().map(|m| &m.table)
    }

    /// Returns true if the end-of-data pass has anything to do for this
    /// program.
    pub fn requires_eod_check(&self) -> bool {
        self.eod_event.is_some()
            || !self.eod_iter.is_empty()
            || self.ematcher.is_some()
            || self.nfas.iter().any(|info| info.nfa.accepts_eod())
    }

    pub(crate) fn program(&self, id: LiteralID) -> Option<&LiteralProgram> {
        self.programs.get(id.as_usize()).and_then(|p| p.as_ref())
    }
}

/// A builder for a [`RoseEngine`].
///
/// Everything added is checked when [`Builder::build`] is called: every
/// index must point at something that exists, and every role switched on
/// must have a state bit.
///
/// # Example
///
/// ```
/// use fdr_rose::{
///     rose::{History, Pred, Role, RoseEngine},
///     ReportID,
/// };
///
/// let mut builder = RoseEngine::builder();
/// builder.role_states(1);
/// let history = History::Anchored { min: 0, max: 9 };
/// let pred = builder.add_pred(Pred::new(history))?;
/// let role = builder.add_role(Role::new(ReportID::must(7)))?;
/// builder.add_eod_iter_role(0, role, Some(pred));
/// let engine = builder.build()?;
/// assert!(engine.requires_eod_check());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    roles: Vec<Role>,
    preds: Vec<Pred>,
    num_role_states: usize,
    eod_iter: Vec<IterMapping>,
    programs: Vec<Option<LiteralProgram>>,
    eod_event: Option<LiteralID>,
    nfas: Vec<Arc<dyn Nfa>>,
    ematcher: Option<(Vec<fdr::Literal>, usize)>,
    ematcher_config: fdr::Config,
    sidecar: Vec<SidecarTrigger>,
    max_bi_anchored_width: Option<u64>,
    initial_groups: Option<GroupMask>,
    requires_eod_side_catchup: bool,
}

impl Builder {
    /// Create an empty builder.
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Set the number of role state bits persisted per stream.
    pub fn role_states(&mut self, len: usize) -> &mut Builder {
        self.num_role_states = len;
        self
    }

    /// Add a role and return its id.
    pub fn add_role(&mut self, role: Role) -> Result<RoleID, BuildError> {
        let id = RoleID::new(self.roles.len())
            .map_err(|_| BuildError::too_many("roles"))?;
        self.roles.push(role);
        Ok(id)
    }

    /// Add a predicate and return its id.
    pub fn add_pred(&mut self, pred: Pred) -> Result<PredID, BuildError> {
        let id = PredID::new(self.preds.len())
            .map_err(|_| BuildError::too_many("predicates"))?;
        self.preds.push(pred);
        Ok(id)
    }

    /// Fire `role` at end-of-data when role state `state` is on and `pred`
    /// holds. A role may be reachable from any number of states, but fires
    /// at most once per walk.
    pub fn add_eod_iter_role(
        &mut self,
        state: usize,
        role: RoleID,
        pred: Option<PredID>,
    ) -> &mut Builder {
        let entry = EodIterRole { role, pred };
        match self.eod_iter.binary_search_by_key(&state, |m| m.state) {
            Ok(i) => self.eod_iter[i].roles.push(entry),
            Err(i) => self
                .eod_iter
                .insert(i, IterMapping { state, roles: vec![entry] }),
        }
        self
    }

    /// Set the program run when literal `id` matches.
    pub fn add_literal_program(
        &mut self,
        id: LiteralID,
        program: LiteralProgram,
    ) -> &mut Builder {
        let i = id.as_usize();
        if self.programs.len() <= i {
            self.programs.resize(i + 1, None);
        }
        self.programs[i] = Some(program);
        self
    }

    /// Run the program of literal `id` as a synthetic event at end-of-data.
    pub fn eod_event_literal(
        &mut self,
        id: Option<LiteralID>,
    ) -> &mut Builder {
        self.eod_event = id;
        self
    }

    /// Add a sub-automaton and return the id of its queue.
    pub fn add_nfa(
        &mut self,
        nfa: Arc<dyn Nfa>,
    ) -> Result<QueueID, BuildError> {
        let id = QueueID::new(self.nfas.len())
            .map_err(|_| BuildError::too_many("queues"))?;
        self.nfas.push(nfa);
        Ok(id)
    }

    /// Scan the last `region_size` bytes of data with these literals at
    /// end-of-data. Every literal needs a program.
    pub fn eod_matcher(
        &mut self,
        literals: Vec<fdr::Literal>,
        region_size: usize,
    ) -> &mut Builder {
        self.ematcher = Some((literals, region_size));
        self
    }

    /// The configuration used to build the end-anchored literal table.
    pub fn eod_matcher_config(
        &mut self,
        config: fdr::Config,
    ) -> &mut Builder {
        self.ematcher_config = config;
        self
    }

    /// Add a sidecar trigger.
    pub fn add_sidecar_trigger(
        &mut self,
        trigger: SidecarTrigger,
    ) -> &mut Builder {
        self.sidecar.push(trigger);
        self
    }

    /// Bound the offsets at which end-of-data matches are possible. Beyond
    /// it the end-of-data pass does nothing.
    pub fn max_bi_anchored_width(
        &mut self,
        width: Option<u64>,
    ) -> &mut Builder {
        self.max_bi_anchored_width = width;
        self
    }

    /// Set the group set a stream starts with. Every group is on by default.
    pub fn initial_groups(&mut self, groups: GroupMask) -> &mut Builder {
        self.initial_groups = Some(groups);
        self
    }

    /// Catch up the sidecar over the whole buffer before a block-mode pass.
    pub fn requires_eod_side_catchup(&mut self, yes: bool) -> &mut Builder {
        self.requires_eod_side_catchup = yes;
        self
    }

    /// Validate everything added and compile the program.
    pub fn build(&self) -> Result<RoseEngine, BuildError> {
        for role in self.roles.iter() {
            if let Some(state) = role.state {
                self.check_state(state)?;
            }
        }
        for mapping in self.eod_iter.iter() {
            self.check_state(mapping.state)?;
            for entry in mapping.roles.iter() {
                let role = self.check_role(entry.role)?;
                match entry.pred {
                    Some(pred) if pred.as_usize() >= self.preds.len() => {
                        return Err(BuildError::invalid_pred(pred));
                    }
                    None if !role.simple_pred => {
                        return Err(BuildError::missing_pred(entry.role));
                    }
                    _ => {}
                }
            }
        }
        for program in self.programs.iter().flatten() {
            for &role in program.roles() {
                self.check_stateful_role(role)?;
            }
            for &queue in program.suffixes() {
                if queue.as_usize() >= self.nfas.len() {
                    return Err(BuildError::invalid_queue(queue));
                }
            }
        }
        if let Some(id) = self.eod_event {
            self.check_program(id)?;
        }
        let ematcher = match self.ematcher {
            None => None,
            Some((ref literals, region_size)) => {
                if region_size == 0 {
                    return Err(BuildError::empty_eod_region());
                }
                for lit in literals.iter() {
                    self.check_program(lit.id())?;
                }
                let table = fdr::Builder::new()
                    .configure(self.ematcher_config.clone())
                    .build(literals)
                    .map_err(BuildError::eod_matcher)?;
                let min_width =
                    literals.iter().map(|lit| lit.len()).min().unwrap_or(0);
                Some(EodMatcher { table, min_width, region_size })
            }
        };
        let mut bytes: Vec<u8> = vec![];
        for trigger in self.sidecar.iter() {
            self.check_stateful_role(trigger.role)?;
            if !bytes.contains(&trigger.byte) {
                bytes.push(trigger.byte);
            }
        }
        if bytes.len() > 3 {
            return Err(BuildError::too_many_sidecar_bytes(bytes.len()));
        }

        let (mut stream_len, mut full_len) = (0, 0);
        let mut nfas = Vec::with_capacity(self.nfas.len());
        for nfa in self.nfas.iter() {
            let stream = stream_len..stream_len + nfa.stream_state_len();
            let full = full_len..full_len + nfa.full_state_len();
            stream_len = stream.end;
            full_len = full.end;
            nfas.push(NfaInfo { nfa: Arc::clone(nfa), stream, full });
        }
        let last_byte_states = self
            .roles
            .iter()
            .filter(|role| role.last_byte_history)
            .filter_map(|role| role.state)
            .collect();
        debug!(
            "built rose program with {} roles, {} role states, {} queues \
             and {} end-of-data iterator keys",
            self.roles.len(),
            self.num_role_states,
            nfas.len(),
            self.eod_iter.len(),
        );
        Ok(RoseEngine {
            roles: self.roles.clone(),
            preds: self.preds.clone(),
            num_role_states: self.num_role_states,
            eod_iter: self.eod_iter.clone(),
            programs: self.programs.clone(),
            eod_event: self.eod_event,
            nfas,
            stream_state_len: stream_len,
            full_state_len: full_len,
            ematcher,
            sidecar: self.sidecar.clone(),
            last_byte_states,
            max_bi_anchored_width: self.max_bi_anchored_width,
            initial_groups: self.initial_groups.unwrap_or(ALL_GROUPS),
            requires_eod_side_catchup: self.requires_eod_side_catchup,
        })
    }

    fn check_state(&self, state: usize) -> Result<(), BuildError> {
        if state >= self.num_role_states {
            return Err(BuildError::invalid_role_state(
                state,
                self.num_role_states,
            ));
        }
        Ok(())
    }

    fn check_role(&self, id: RoleID) -> Result<&Role, BuildError> {
        self.roles
            .get(id.as_usize())
            .ok_or_else(|| BuildError::invalid_role(id))
    }

    fn check_stateful_role(&self, id: RoleID) -> Result<(), BuildError> {
        match self.check_role(id)?.state {
            Some(_) => Ok(()),
            None => Err(BuildError::stateless_role(id)),
        }
    }

    fn check_program(&self, id: LiteralID) -> Result<(), BuildError> {
        match self.programs.get(id.as_usize()) {
            Some(Some(_)) => Ok(()),
            _ => Err(BuildError::missing_literal_program(id)),
        }
    }
}
