use thiserror::Error;

/// Run-aborting simulation failures.
///
/// None of these are retried; a worker evaluating a phase ordering logs
/// the error and drops that ordering from the result set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("manual action {action_id} ({action_name}) is trying to subtract {take} {kind} from {land}, but there are only {have}")]
    ManualUnderflow {
        action_id: String,
        action_name: String,
        land: String,
        kind: String,
        have: i32,
        take: i32,
    },

    #[error("land {land} has no entry in the distance tree")]
    MissingRoute { land: String },

    #[error("unknown land key: {land}")]
    UnknownLand { land: String },

    #[error("unknown phase name: {name}")]
    UnknownPhase { name: String },
}
