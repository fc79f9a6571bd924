//! Property tests over randomly sized images and kernels.

use hlsnet_core::layers::apply;
use hlsnet_core::*;
use proptest::prelude::*;

fn odd_kernel() -> impl Strategy<Value = usize> {
    (0usize..4).prop_map(|k| 2 * k + 1)
}

fn image(rows: usize, cols: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0f32..100.0, rows * cols)
}

fn sized_image() -> impl Strategy<Value = (usize, usize, Vec<f32>)> {
    (1usize..12, 1usize..12).prop_flat_map(|(r, c)| (Just(r), Just(c), image(r, c)))
}

proptest! {
    #[test]
    fn padded_size_adds_kernel_minus_one(rows in 1usize..64, cols in 1usize..64, kh in odd_kernel(), kw in odd_kernel()) {
        let (h, w) = padded_size(rows, cols, kh, kw).unwrap();
        prop_assert_eq!(h, rows + kh - 1);
        prop_assert_eq!(w, cols + kw - 1);
        prop_assert_eq!(pad_width(kh).unwrap() * 2 + rows, h);
    }

    #[test]
    fn even_kernels_are_always_rejected(half in 1usize..8, other in odd_kernel()) {
        let even = half * 2;
        let rows_rejected = matches!(padded_size(5, 5, even, other), Err(Error::EvenKernel { .. }));
        let cols_rejected = matches!(padded_size(5, 5, other, even), Err(Error::EvenKernel { .. }));
        prop_assert!(rows_rejected, "even kernel rows accepted: {}x{}", even, other);
        prop_assert!(cols_rejected, "even kernel cols accepted: {}x{}", other, even);
        let weights = vec![0.0f32; even * other];
        prop_assert!(KernelBank::single_channel(&weights, &[0.0], even, other).is_err());
    }

    #[test]
    fn preprocessing_output_matches_padded_size((rows, cols, pixels) in sized_image(), k in odd_kernel(), edge in any::<bool>()) {
        let policy = if edge { PaddingPolicy::Edge } else { PaddingPolicy::Zero };
        let pre = Preprocessor::new(Normalization::Identity, policy, k, k).unwrap();
        let padded = pre.run(Plane::new(&pixels, rows, cols).unwrap()).unwrap();
        prop_assert_eq!(padded.shape(), Shape::d3(1, rows + k - 1, cols + k - 1));

        // The interior is the image itself
        let p = pad_width(k).unwrap();
        for y in 0..rows {
            for x in 0..cols {
                prop_assert_eq!(padded.get(0, y + p, x + p), Some(pixels[y * cols + x]));
            }
        }
    }

    #[test]
    fn zero_kernel_yields_zero_map((rows, cols, pixels) in sized_image(), k in odd_kernel()) {
        let weights = vec![0.0f32; k * k];
        let bank = KernelBank::single_channel(&weights, &[0.0], k, k).unwrap();
        let conv = Conv2D::new(bank, PaddingPolicy::Zero);
        let input = FeatureMap::from_vec(pixels, Shape::d3(1, rows, cols)).unwrap();
        let out = apply(&conv, &input).unwrap();
        prop_assert_eq!(out.shape(), Shape::d3(1, rows, cols));
        prop_assert!(out.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn interior_outputs_are_window_dot_products(
        pixels in image(6, 7),
        kernel in prop::collection::vec(-2.0f32..2.0, 9),
        bias in -1.0f32..1.0,
    ) {
        let biases = [bias];
        let bank = KernelBank::single_channel(&kernel, &biases, 3, 3).unwrap();
        let conv = Conv2D::new(bank, PaddingPolicy::Zero);
        let input = FeatureMap::from_vec(pixels.clone(), Shape::d3(1, 6, 7)).unwrap();
        let out = apply(&conv, &input).unwrap();

        for y in 1..5 {
            for x in 1..6 {
                let mut acc = 0.0f32;
                for ky in 0..3 {
                    for kx in 0..3 {
                        acc += kernel[ky * 3 + kx] * pixels[(y + ky - 1) * 7 + (x + kx - 1)];
                    }
                }
                let expected = acc + bias;
                let got = out.get(0, y, x).unwrap();
                prop_assert!((got - expected).abs() <= 1e-3, "({}, {}): {} vs {}", y, x, got, expected);
            }
        }
    }

    #[test]
    fn relu_is_idempotent_and_non_negative(data in prop::collection::vec(-1e6f32..1e6, 0..64)) {
        let mut once = data.clone();
        math::activate(&mut once, Activation::Relu);
        prop_assert!(once.iter().all(|&v| v >= 0.0));
        let mut twice = once.clone();
        math::activate(&mut twice, Activation::Relu);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn classify_returns_first_maximum(scores in prop::collection::vec(-10.0f32..10.0, 1..32)) {
        let idx = classify(&scores).unwrap();
        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        prop_assert_eq!(scores[idx], max);
        prop_assert!(scores[..idx].iter().all(|&v| v < max));
    }

    #[test]
    fn inference_is_deterministic(pixels in image(6, 6)) {
        let kernel: Vec<f32> = (0..18).map(|v| (v as f32 - 8.5) * 0.1).collect();
        let dense_w: Vec<f32> = (0..54).map(|v| ((v % 5) as f32 - 2.0) * 0.3).collect();
        let stage = ConvStage::new(
            Conv2D::new(KernelBank::single_channel(&kernel, &[0.1, -0.2], 3, 3).unwrap(), PaddingPolicy::Edge),
            Activation::Relu,
            Some(Pool2D::max_square(2).unwrap()),
        ).unwrap();
        let dense = Dense::new(&dense_w, &[0.0, 0.5, -0.5], 18, 3).unwrap();
        let net = ConvNet::new(6, 6, Normalization::Identity, vec![stage], dense).unwrap();

        let plane = Plane::new(&pixels, 6, 6).unwrap();
        let first: Vec<u32> = net.infer(plane).unwrap().scores().iter().map(|v| v.to_bits()).collect();
        let second: Vec<u32> = net.infer(plane).unwrap().scores().iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(first, second);
    }
}
