pub mod analysis;
pub mod bins;
pub mod decode;
pub mod features;
pub mod fft;
pub mod realtime;
pub mod ring;
pub mod smoothing;
pub mod window;
