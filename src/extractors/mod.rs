pub mod direct;
pub mod ytdlp;

pub use direct::DirectProvider;
pub use ytdlp::YtDlpProvider;
