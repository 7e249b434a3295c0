use fedchain_messages::MessageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("cannot tally an unsigned server fault")]
    UnsignedFault,

    #[error("fault tally for {server_id} at height {db_height}/{height} is full ({max} signers)")]
    TallyFull {
        server_id: String,
        db_height: u32,
        height: u32,
        max: usize,
    },

    #[error(transparent)]
    Message(#[from] MessageError),
}
