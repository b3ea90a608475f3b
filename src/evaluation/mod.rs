use serde::Serialize;
use sha2::{Digest, Sha256};

// Flag data needed for evaluation, all fields guaranteed present.
// The store enforces NOT NULL on every column this is built from.
#[derive(Debug, Clone)]
pub struct FlagState {
    pub name: String,
    pub enabled: bool,
    pub rollout_percentage: i32,
    pub allowed_users: Vec<String>,
}

// Why a verdict was reached. Wire values are part of the API contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationReason {
    FlagDisabled,
    UserInAllowlist,
    RolloutPercentage,
    NotInRolloutPercentage,
    DefaultDeny,
}

// Flag evaluation result
#[derive(Debug, Serialize)]
pub struct FlagEvaluation {
    pub enabled: bool,
    pub reason: EvaluationReason,
}

/// Evaluate whether a flag is enabled for a given user.
///
/// Pure and deterministic: the same (flag, user_id) pair always yields
/// the same verdict. Rules apply in strict order, first match wins:
/// 1. Disabled flag is off for everyone.
/// 2. Allowlisted users always get the feature, even at 0% rollout.
/// 3. Percentage rollout via a stable per-(user, flag) hash bucket.
/// 4. Otherwise deny.
pub fn evaluate_flag(flag: &FlagState, user_id: &str) -> FlagEvaluation {
    if !flag.enabled {
        return FlagEvaluation {
            enabled: false,
            reason: EvaluationReason::FlagDisabled,
        };
    }

    if flag.allowed_users.iter().any(|u| u == user_id) {
        return FlagEvaluation {
            enabled: true,
            reason: EvaluationReason::UserInAllowlist,
        };
    }

    if flag.rollout_percentage > 0 {
        if rollout_bucket(user_id, &flag.name) < flag.rollout_percentage {
            return FlagEvaluation {
                enabled: true,
                reason: EvaluationReason::RolloutPercentage,
            };
        }
        return FlagEvaluation {
            enabled: false,
            reason: EvaluationReason::NotInRolloutPercentage,
        };
    }

    FlagEvaluation {
        enabled: false,
        reason: EvaluationReason::DefaultDeny,
    }
}

/// Deterministic bucket in [0, 100) for a (user, flag) pair.
///
/// Hashes "{user_id}:{flag_name}" with SHA-256 and takes the first
/// 8 bytes of the digest as a big-endian u64, modulo 100. The exact
/// byte layout is load-bearing: stored rollout assignments stay valid
/// across processes and versions only if it never changes. Including
/// the flag name keeps a user's bucket independent across flags, so
/// nobody is a systematic early or late adopter.
fn rollout_bucket(user_id: &str, flag_name: &str) -> i32 {
    let digest = Sha256::digest(format!("{}:{}", user_id, flag_name));

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);

    (u64::from_be_bytes(prefix) % 100) as i32
}
