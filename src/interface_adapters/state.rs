use crate::interface_adapters::net::LoopEvent;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    // Every socket task feeds the single session loop through this channel.
    pub loop_tx: mpsc::Sender<LoopEvent>,
    // Frames a socket may lag behind before new ones are dropped.
    pub outgoing_queue_capacity: usize,
}
