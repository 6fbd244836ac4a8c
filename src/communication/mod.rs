mod data_by_rank;
mod local;
mod sized_communicator;

pub use data_by_rank::DataByRank;
pub use local::get_local_communicators;
pub use local::LocalCommunicator;
pub use sized_communicator::SizedCommunicator;

pub type Rank = i32;

pub const MAIN_RANK: Rank = 0;
