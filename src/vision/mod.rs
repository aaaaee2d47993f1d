pub mod interface;
pub mod prompt;
pub mod image_prep;
pub mod openai_vision;

pub use interface::{PreparedImage, VisionError, VisionTranslator};
pub use image_prep::prepare_image;
pub use openai_vision::OpenAIVision;
pub use prompt::build_prompt;
