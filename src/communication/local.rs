use std::sync::mpsc::channel;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;
use std::sync::mpsc::TryRecvError;

use super::DataByRank;
use super::Rank;
use super::SizedCommunicator;

/// Message passing between ranks living on the same machine. Every
/// rank owns one receiving channel into which all other ranks send;
/// messages arrive tagged with their source rank, which gives the
/// any-source receive the coordinator loop is built on. Per-sender
/// ordering is preserved.
pub struct LocalCommunicator<T> {
    senders: DataByRank<Sender<(Rank, T)>>,
    receiver: Receiver<(Rank, T)>,
    rank: Rank,
    size: usize,
}

impl<T> LocalCommunicator<T> {
    fn new(
        senders: DataByRank<Sender<(Rank, T)>>,
        receiver: Receiver<(Rank, T)>,
        rank: Rank,
        size: usize,
    ) -> Self {
        Self {
            senders,
            receiver,
            rank,
            size,
        }
    }

    pub fn send(&self, rank: Rank, data: T) {
        self.senders[rank].send((self.rank, data)).unwrap();
    }

    /// Block until a message from any rank arrives.
    pub fn receive_any(&self) -> (Rank, T) {
        self.receiver.recv().unwrap()
    }

    /// Non-blocking probe for a pending message.
    pub fn try_receive_any(&self) -> Option<(Rank, T)> {
        match self.receiver.try_recv() {
            Ok(received) => Some(received),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                panic!("Communicator channel disconnected while probing")
            }
        }
    }
}

impl<T> SizedCommunicator for LocalCommunicator<T> {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }
}

/// One connected communicator per rank.
pub fn get_local_communicators<T>(size: usize) -> Vec<LocalCommunicator<T>> {
    let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| channel()).unzip();
    receivers
        .into_iter()
        .enumerate()
        .map(|(rank, receiver)| {
            let mut rank_senders = DataByRank::empty();
            for (other, sender) in senders.iter().enumerate() {
                if other != rank {
                    rank_senders.insert(other as Rank, sender.clone());
                }
            }
            LocalCommunicator::new(rank_senders, receiver, rank as Rank, size)
        })
        .collect()
}
