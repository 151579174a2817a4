//! MiniGoogLeNet for the [Burn](https://github.com/tracel-ai/burn) deep
//! learning framework.
//!
//! A CIFAR-scale GoogLeNet variant built from inception blocks (parallel 1x1
//! and 3x3 convolutions concatenated on the channel axis) and downsample
//! blocks (a strided convolution next to a max pooling, concatenated the same
//! way). The crate defines the architecture only; training, data loading and
//! persistence are left to the framework.
//!
//! ```rust,ignore
//! use burn::backend::NdArray;
//! use mini_googlenet::MiniGoogLeNetConfig;
//!
//! let device = Default::default();
//! let model = MiniGoogLeNetConfig::new(32, 32, 3, 10).init::<NdArray>(&device);
//! let probabilities = model.forward(images);
//! ```

pub mod block;
pub mod model;

pub use model::{ChannelLayout, MiniGoogLeNet, MiniGoogLeNetConfig};
