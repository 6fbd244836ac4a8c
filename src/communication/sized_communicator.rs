use super::Rank;

pub trait SizedCommunicator {
    fn size(&self) -> usize;
    fn rank(&self) -> Rank;

    fn is_main(&self) -> bool {
        self.rank() == super::MAIN_RANK
    }
}
