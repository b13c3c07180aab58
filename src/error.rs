use thiserror::Error;

#[derive(Error, Debug)]
pub enum SketchroomError {
    #[error("Malformed message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    #[error("Empty room token")]
    EmptyRoomToken,

    #[error("Invalid canvas size: {0}x{1}")]
    InvalidCanvasSize(u32, u32),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
}
