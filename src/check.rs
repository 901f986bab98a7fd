//! Connection compatibility rules.
//!
//! [`check_pair`] is the fixed state machine deciding whether two connections
//! may be wired together. Rules are evaluated in order and the first failing
//! rule determines the reported [`CheckResult`]; incompatibility is an
//! ordinary outcome during dragging, so it is reported as a value rather than
//! an error.

use crate::graph::BlockGraph;
use crate::connection::ConnectionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a compatibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckResult {
    CanConnect,
    ReasonSelfConnection,
    ReasonWrongType,
    ReasonMustDisconnect,
    ReasonTargetNull,
    ReasonSourceBlockNull,
    ReasonCannotSetShadowForTarget,
    ReasonInferiorBlockShadowMismatch,
    ReasonTypeChecksFailed,
    /// The pair is farther apart than the search radius
    ReasonOutOfRange,
}

impl CheckResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckResult::CanConnect)
    }

    /// Combine two results (AND logic): returns the first failure if any
    pub fn and(self, other: CheckResult) -> CheckResult {
        match self {
            CheckResult::CanConnect => other,
            failed => failed,
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::CanConnect => "Connections are compatible",
            Self::ReasonSelfConnection => "Cannot connect a block to itself",
            Self::ReasonWrongType => "Connection types do not pair",
            Self::ReasonMustDisconnect => "Connection is already connected",
            Self::ReasonTargetNull => "Target connection is missing",
            Self::ReasonSourceBlockNull => "Connection has no source block",
            Self::ReasonCannotSetShadowForTarget => "Cannot mix shadow and non-shadow blocks in a real connection",
            Self::ReasonInferiorBlockShadowMismatch => "Child block of a shadow connection must be a shadow block",
            Self::ReasonTypeChecksFailed => "Type checks do not match",
            Self::ReasonOutOfRange => "Connections are too far apart",
        };
        f.write_str(message)
    }
}

/// Which target slot a check (or a connect) applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectMode {
    /// The live wiring slot (`target`)
    Real,
    /// The default-placeholder slot (`shadow_target`)
    Shadow,
}

/// Evaluate the compatibility rules for connecting `a` to `b`.
///
/// 1. `b` is absent (or unknown) → `ReasonTargetNull`
/// 2. either side has no source block → `ReasonSourceBlockNull`
/// 3. both sides share a source block → `ReasonSelfConnection`
/// 4. types are not the complementary pair → `ReasonWrongType`
/// 5. either side already fills the slot `mode` selects → `ReasonMustDisconnect`
/// 6. real connect between a shadow and a non-shadow block → `ReasonCannotSetShadowForTarget`
/// 7. shadow connect whose child side is not on a shadow block → `ReasonInferiorBlockShadowMismatch`
/// 8. both sides declare type checks that do not intersect → `ReasonTypeChecksFailed`
pub fn check_pair(
    graph: &BlockGraph,
    a: ConnectionId,
    b: Option<ConnectionId>,
    mode: ConnectMode,
) -> CheckResult {
    let Some(target) = b.and_then(|id| graph.connection(id)) else {
        return CheckResult::ReasonTargetNull;
    };
    let Some(source) = graph.connection(a) else {
        return CheckResult::ReasonSourceBlockNull;
    };
    let (Some(source_block), Some(target_block)) = (source.source_block, target.source_block) else {
        return CheckResult::ReasonSourceBlockNull;
    };

    if source_block == target_block {
        return CheckResult::ReasonSelfConnection;
    }

    if source.connection_type.opposite() != target.connection_type {
        return CheckResult::ReasonWrongType;
    }

    let occupied = match mode {
        ConnectMode::Real => source.target.is_some() || target.target.is_some(),
        ConnectMode::Shadow => source.shadow_target.is_some() || target.shadow_target.is_some(),
    };
    if occupied {
        return CheckResult::ReasonMustDisconnect;
    }

    let source_shadow = graph.block(source_block).is_some_and(|b| b.shadow);
    let target_shadow = graph.block(target_block).is_some_and(|b| b.shadow);

    match mode {
        ConnectMode::Real => {
            if source_shadow != target_shadow {
                return CheckResult::ReasonCannotSetShadowForTarget;
            }
        }
        ConnectMode::Shadow => {
            let inferior_shadow = if source.connection_type.is_inferior() {
                source_shadow
            } else {
                target_shadow
            };
            if !inferior_shadow {
                return CheckResult::ReasonInferiorBlockShadowMismatch;
            }
        }
    }

    if !source.type_checks.compatible_with(&target.type_checks) {
        return CheckResult::ReasonTypeChecksFailed;
    }

    CheckResult::CanConnect
}

/// The mode a snap search evaluates a pair under.
///
/// Shadow connects are only proposed when `allow_shadows` is set and one of
/// the two connections lives on a shadow block; otherwise the pair is judged
/// as a real connect, which rule 6 then rejects for mixed pairs.
pub fn mode_for(graph: &BlockGraph, a: ConnectionId, b: ConnectionId, allow_shadows: bool) -> ConnectMode {
    if allow_shadows && (graph.is_shadow(a) || graph.is_shadow(b)) {
        ConnectMode::Shadow
    } else {
        ConnectMode::Real
    }
}
