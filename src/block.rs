//! Layer compositions the MiniGoogLeNet graph is assembled from.

use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig2d, Relu};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Configuration to create a [ConvBlock] using the [init function](ConvBlockConfig::init).
#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    /// The number of input and output channels, `[in, out]`.
    pub channels: [usize; 2],
    /// The size of the kernel.
    pub kernel_size: [usize; 2],
    /// The stride.
    #[config(default = "[1, 1]")]
    pub stride: [usize; 2],
    /// The padding configuration. Defaults to size-preserving padding.
    #[config(default = "PaddingConfig2d::Same")]
    pub padding: PaddingConfig2d,
}

/// A convolution followed by batch normalization over the channel axis and a
/// rectified-linear activation.
///
/// Should be created with [ConvBlockConfig].
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
    activation: Relu,
}

impl ConvBlockConfig {
    /// Initialize a new [conv block](ConvBlock) module.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvBlock<B> {
        ConvBlock {
            conv: Conv2dConfig::new(self.channels, self.kernel_size)
                .with_stride(self.stride)
                .with_padding(self.padding.clone())
                .init(device),
            norm: BatchNormConfig::new(self.channels[1]).init(device),
            activation: Relu::new(),
        }
    }
}

impl<B: Backend> ConvBlock<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[batch_size, channels_in, height_in, width_in]`
    /// - output: `[batch_size, channels_out, height_out, width_out]`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(input);
        let x = self.norm.forward(x);
        self.activation.forward(x)
    }
}

/// Configuration to create an [InceptionBlock] using the [init function](InceptionBlockConfig::init).
#[derive(Config, Debug)]
pub struct InceptionBlockConfig {
    /// The number of input channels.
    pub channels_in: usize,
    /// The number of channels produced by the 1x1 branch.
    pub channels_1x1: usize,
    /// The number of channels produced by the 3x3 branch.
    pub channels_3x3: usize,
}

/// Two parallel [conv blocks](ConvBlock) over the same input, one with a 1x1
/// kernel and one with a 3x3 kernel, concatenated along the channel axis.
///
/// Both branches use stride 1 and size-preserving padding, so their spatial
/// dimensions always agree and the block only grows the channel axis.
#[derive(Module, Debug)]
pub struct InceptionBlock<B: Backend> {
    conv_1x1: ConvBlock<B>,
    conv_3x3: ConvBlock<B>,
}

impl InceptionBlockConfig {
    /// Initialize a new [inception block](InceptionBlock) module.
    pub fn init<B: Backend>(&self, device: &B::Device) -> InceptionBlock<B> {
        InceptionBlock {
            conv_1x1: ConvBlockConfig::new([self.channels_in, self.channels_1x1], [1, 1])
                .init(device),
            conv_3x3: ConvBlockConfig::new([self.channels_in, self.channels_3x3], [3, 3])
                .init(device),
        }
    }

    /// The number of channels the block outputs.
    pub fn channels_out(&self) -> usize {
        self.channels_1x1 + self.channels_3x3
    }
}

impl<B: Backend> InceptionBlock<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[batch_size, channels_in, height, width]`
    /// - output: `[batch_size, channels_1x1 + channels_3x3, height, width]`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let narrow = self.conv_1x1.forward(input.clone());
        let wide = self.conv_3x3.forward(input);

        Tensor::cat(vec![narrow, wide], 1)
    }
}

/// Configuration to create a [DownsampleBlock] using the [init function](DownsampleBlockConfig::init).
#[derive(Config, Debug)]
pub struct DownsampleBlockConfig {
    /// The number of input channels.
    pub channels_in: usize,
    /// The number of channels produced by the convolution branch.
    pub channels_conv: usize,
}

/// A strided [conv block](ConvBlock) and a max pooling of the same geometry
/// over the same input, concatenated along the channel axis.
///
/// Halves the spatial resolution while mixing a learned downsampling path
/// with a fixed one. Both branches use a 3x3 window, stride 2 and no padding,
/// so their spatial output dimensions match and concatenation is always valid.
#[derive(Module, Debug)]
pub struct DownsampleBlock<B: Backend> {
    conv: ConvBlock<B>,
    pool: MaxPool2d,
}

impl DownsampleBlockConfig {
    /// Initialize a new [downsample block](DownsampleBlock) module.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DownsampleBlock<B> {
        DownsampleBlock {
            conv: ConvBlockConfig::new([self.channels_in, self.channels_conv], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Valid)
                .init(device),
            pool: MaxPool2dConfig::new([3, 3]).with_strides([2, 2]).init(),
        }
    }

    /// The number of channels the block outputs.
    ///
    /// The pooling branch carries the input channels through unchanged.
    pub fn channels_out(&self) -> usize {
        self.channels_in + self.channels_conv
    }

    /// The spatial size one side of the feature map shrinks to.
    ///
    /// Both branches are valid-padded 3x3 windows with stride 2. Returns 0
    /// when the window no longer fits in the input.
    pub fn output_size(size: usize) -> usize {
        if size < 3 {
            return 0;
        }

        (size - 3) / 2 + 1
    }
}

impl<B: Backend> DownsampleBlock<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[batch_size, channels_in, height, width]`
    /// - output: `[batch_size, channels_in + channels_conv, (height - 3) / 2 + 1, (width - 3) / 2 + 1]`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let learned = self.conv.forward(input.clone());
        let pooled = self.pool.forward(input);

        Tensor::cat(vec![learned, pooled], 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn conv_block_preserves_spatial_dims() {
        let device = Default::default();
        let block = ConvBlockConfig::new([3, 16], [3, 3]).init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 4>::ones([2, 3, 19, 16], &device);
        let output = block.forward(input);

        assert_eq!(output.dims(), [2, 16, 19, 16]);
    }

    #[test]
    fn conv_block_strided_valid() {
        let device = Default::default();
        let block = ConvBlockConfig::new([3, 8], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Valid)
            .init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 4>::ones([1, 3, 32, 32], &device);
        let output = block.forward(input);

        // (32 - 3) / 2 + 1 = 15
        assert_eq!(output.dims(), [1, 8, 15, 15]);
    }

    #[test]
    fn inception_output_channels_are_branch_sum() {
        let device = Default::default();
        let config = InceptionBlockConfig::new(8, 4, 6);
        assert_eq!(config.channels_out(), 10);

        let block = config.init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 4>::ones([1, 8, 10, 10], &device);
        let output = block.forward(input);

        assert_eq!(output.dims(), [1, 10, 10, 10]);
    }

    #[test]
    fn downsample_halves_spatial_dims() {
        let device = Default::default();
        let config = DownsampleBlockConfig::new(4, 6);
        let block = config.init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 4>::ones([1, 4, 15, 15], &device);
        let output = block.forward(input);

        // Both branches: (15 - 3) / 2 + 1 = 7, channels 4 + 6.
        assert_eq!(output.dims(), [1, 10, 7, 7]);
        assert_eq!(DownsampleBlockConfig::output_size(15), 7);
    }

    #[test]
    fn output_size_collapses_below_window() {
        assert_eq!(DownsampleBlockConfig::output_size(3), 1);
        assert_eq!(DownsampleBlockConfig::output_size(2), 0);
        assert_eq!(DownsampleBlockConfig::output_size(1), 0);
        assert_eq!(DownsampleBlockConfig::output_size(0), 0);
    }

    #[test]
    fn downsample_even_input() {
        let device = Default::default();
        let block = DownsampleBlockConfig::new(3, 5).init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 4>::ones([2, 3, 32, 32], &device);
        let output = block.forward(input);

        assert_eq!(output.dims(), [2, 8, 15, 15]);
        assert_eq!(DownsampleBlockConfig::output_size(32), 15);
    }
}
