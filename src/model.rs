//! The MiniGoogLeNet architecture.

use burn::config::Config;
use burn::module::{Ignored, Module};
use burn::nn::pool::{AvgPool2d, AvgPool2dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::activation::softmax;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::block::{
    ConvBlock, ConvBlockConfig, DownsampleBlock, DownsampleBlockConfig, InceptionBlock,
    InceptionBlockConfig,
};

/// Size of the global average pooling window applied before the classifier.
const GLOBAL_POOL_SIZE: usize = 7;

/// How the channel axis is ordered in input images.
///
/// The network itself always runs channels-first, Burn's native ordering;
/// channels-last input is permuted on entry. The assembled graph is
/// structurally identical either way.
#[derive(Config, Debug, PartialEq)]
pub enum ChannelLayout {
    /// `[batch, channels, height, width]` input.
    ChannelsFirst,
    /// `[batch, height, width, channels]` input.
    ChannelsLast,
}

impl ChannelLayout {
    fn is_channels_last(&self) -> bool {
        *self == ChannelLayout::ChannelsLast
    }
}

/// Configuration to create a [MiniGoogLeNet] using the [init function](MiniGoogLeNetConfig::init).
///
/// `new(width, height, channels, num_classes)` takes the input image geometry
/// and the number of target classes; the remaining fields are the fixed
/// hyperparameters of this architecture variant.
#[derive(Config, Debug)]
pub struct MiniGoogLeNetConfig {
    /// Input image width.
    pub width: usize,
    /// Input image height.
    pub height: usize,
    /// Input image channels.
    pub channels: usize,
    /// The number of output classes.
    pub num_classes: usize,
    /// The dropout rate applied after global pooling.
    #[config(default = 0.5)]
    pub dropout: f64,
    /// The channel ordering of input images.
    #[config(default = "ChannelLayout::ChannelsFirst")]
    pub layout: ChannelLayout,
}

/// The MiniGoogLeNet image classification network.
///
/// A CIFAR-scale GoogLeNet variant: a convolutional stem, eight
/// [inception blocks](InceptionBlock) interleaved with two
/// [downsample blocks](DownsampleBlock), then global average pooling,
/// dropout and a linear softmax classifier.
///
/// Should be created with [MiniGoogLeNetConfig].
#[derive(Module, Debug)]
pub struct MiniGoogLeNet<B: Backend> {
    stem: ConvBlock<B>,
    inception_1a: InceptionBlock<B>,
    inception_1b: InceptionBlock<B>,
    downsample_1: DownsampleBlock<B>,
    inception_2a: InceptionBlock<B>,
    inception_2b: InceptionBlock<B>,
    inception_2c: InceptionBlock<B>,
    inception_2d: InceptionBlock<B>,
    downsample_2: DownsampleBlock<B>,
    inception_3a: InceptionBlock<B>,
    inception_3b: InceptionBlock<B>,
    pool: AvgPool2d,
    dropout: Dropout,
    output: Linear<B>,
    layout: Ignored<ChannelLayout>,
}

impl MiniGoogLeNetConfig {
    /// Initializes a new [MiniGoogLeNet] model.
    ///
    /// # Panics
    ///
    /// Panics if the feature map reaching the global average pooling stage is
    /// smaller than its 7x7 window, i.e. the input images are too small for
    /// the two downsampling stages of this architecture.
    pub fn init<B: Backend>(&self, device: &B::Device) -> MiniGoogLeNet<B> {
        let stem = ConvBlockConfig::new([self.channels, 96], [3, 3]);

        let inception_1a = InceptionBlockConfig::new(96, 32, 32);
        let inception_1b = InceptionBlockConfig::new(inception_1a.channels_out(), 32, 48);
        let downsample_1 = DownsampleBlockConfig::new(inception_1b.channels_out(), 80);

        let inception_2a = InceptionBlockConfig::new(downsample_1.channels_out(), 112, 48);
        let inception_2b = InceptionBlockConfig::new(inception_2a.channels_out(), 96, 64);
        let inception_2c = InceptionBlockConfig::new(inception_2b.channels_out(), 80, 80);
        let inception_2d = InceptionBlockConfig::new(inception_2c.channels_out(), 48, 96);
        let downsample_2 = DownsampleBlockConfig::new(inception_2d.channels_out(), 96);

        let inception_3a = InceptionBlockConfig::new(downsample_2.channels_out(), 176, 160);
        let inception_3b = InceptionBlockConfig::new(inception_3a.channels_out(), 176, 160);

        // The stem and all inception branches preserve spatial dims, so only
        // the two downsample stages change the feature map geometry.
        let height = DownsampleBlockConfig::output_size(DownsampleBlockConfig::output_size(
            self.height,
        ));
        let width =
            DownsampleBlockConfig::output_size(DownsampleBlockConfig::output_size(self.width));

        if height < GLOBAL_POOL_SIZE || width < GLOBAL_POOL_SIZE {
            panic!(
                "Global average pooling needs a feature map of at least {size}x{size}, \
                 but {h}x{w} input images leave only {fh}x{fw} after downsampling",
                size = GLOBAL_POOL_SIZE,
                h = self.height,
                w = self.width,
                fh = height,
                fw = width,
            );
        }

        let pooled_height = (height - GLOBAL_POOL_SIZE) / GLOBAL_POOL_SIZE + 1;
        let pooled_width = (width - GLOBAL_POOL_SIZE) / GLOBAL_POOL_SIZE + 1;
        let d_features = inception_3b.channels_out() * pooled_height * pooled_width;

        log::debug!(
            "classifier takes {d_features} features ({channels} channels, {pooled_height}x{pooled_width} pooled map)",
            channels = inception_3b.channels_out(),
        );

        MiniGoogLeNet {
            stem: stem.init(device),
            inception_1a: inception_1a.init(device),
            inception_1b: inception_1b.init(device),
            downsample_1: downsample_1.init(device),
            inception_2a: inception_2a.init(device),
            inception_2b: inception_2b.init(device),
            inception_2c: inception_2c.init(device),
            inception_2d: inception_2d.init(device),
            downsample_2: downsample_2.init(device),
            inception_3a: inception_3a.init(device),
            inception_3b: inception_3b.init(device),
            pool: AvgPool2dConfig::new([GLOBAL_POOL_SIZE, GLOBAL_POOL_SIZE])
                .with_strides([GLOBAL_POOL_SIZE, GLOBAL_POOL_SIZE])
                .init(),
            dropout: DropoutConfig::new(self.dropout).init(),
            output: LinearConfig::new(d_features, self.num_classes).init(device),
            layout: Ignored(self.layout.clone()),
        }
    }
}

impl<B: Backend> MiniGoogLeNet<B> {
    /// Applies the forward pass, producing one probability distribution over
    /// the classes per example.
    ///
    /// # Shapes
    ///
    /// - input: `[batch_size, channels, height, width]`, or
    ///   `[batch_size, height, width, channels]` with [ChannelLayout::ChannelsLast]
    /// - output: `[batch_size, num_classes]`, rows summing to 1
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward_logits(images), 1)
    }

    /// Applies the forward pass up to the classifier, before the softmax.
    ///
    /// Useful with loss functions that expect logits.
    pub fn forward_logits(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = if self.layout.is_channels_last() {
            images.permute([0, 3, 1, 2])
        } else {
            images
        };

        let x = self.stem.forward(x);

        let x = self.inception_1a.forward(x);
        let x = self.inception_1b.forward(x);
        let x = self.downsample_1.forward(x);

        let x = self.inception_2a.forward(x);
        let x = self.inception_2b.forward(x);
        let x = self.inception_2c.forward(x);
        let x = self.inception_2d.forward(x);
        let x = self.downsample_2.forward(x);

        let x = self.inception_3a.forward(x);
        let x = self.inception_3b.forward(x);

        let x = self.pool.forward(x);
        let x = self.dropout.forward(x);
        let x = x.flatten(1, 3);

        self.output.forward(x)
    }
}
