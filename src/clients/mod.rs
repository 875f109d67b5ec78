pub mod completion_client;
pub mod vision_client;

pub use completion_client::CompletionClient;
pub use vision_client::VisionClient;
