//! Integration tests for the uc2 binding crates.
//!
//! These tests exercise the crates together the way the Python extension
//! and the command line tool drive them: images decoded by the toolkit are
//! staged through colour transforms, layouts pick up settings, and handles
//! follow the engine lifecycles.

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
    use tempfile::tempdir;
    use uc_cms::{Intent, PixelMode, Profile, Transform};
    use uc_core::{Handle, Settings};
    use uc_img::{Frame, ImageType, Toolkit, Wand};
    use uc_text::{
        Alignment, FontDescription, FontSize, Layout, ParagraphBuilder, TextError,
        cluster_positions,
    };

    /// 32x32 RGBA gradient with more than 256 distinct colours.
    fn gradient() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(32, 32, |x, y| {
            Rgba([(x * 8) as u8, (y * 8) as u8, 128, 255])
        }))
    }

    fn transform(
        input: &Profile,
        in_mode: PixelMode,
        output: &Profile,
        out_mode: PixelMode,
    ) -> Transform {
        Transform::new(input, in_mode, output, out_mode, Intent::Perceptual, 0).unwrap()
    }

    /// Full pipeline: write PNG -> load into a wand -> stage pixels through
    /// an sRGB to gray transform -> write the gray frame back out.
    #[test]
    fn test_wand_pixels_through_transform() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.png");
        let dst = dir.path().join("gray.png");

        let toolkit = Toolkit::isolated();
        toolkit.genesis();

        let mut wand = Wand::new();
        wand.push(Frame::new(gradient()));
        wand.write(&src).unwrap();

        let mut guarded = toolkit.new_wand().unwrap();
        guarded.get_mut().unwrap().load(&src).unwrap();
        let loaded = guarded.get().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.image_type(), ImageType::TrueColorMatte);

        let rgba = loaded.current().unwrap().image.to_rgba8();
        let (w, h) = rgba.dimensions();
        let pixels = uc_cms::pixels_from_image(
            rgba.as_raw(),
            w as usize * 4,
            w as usize,
            h as usize,
            4,
        )
        .unwrap();

        let srgb = Profile::srgb();
        let gray = Profile::gray().unwrap();
        let t = transform(&srgb, PixelMode::Rgba, &gray, PixelMode::Gray8);

        // transform_pixels works one row at a time; gray output is packed
        // at the front of the padded buffer.
        let row_bytes = w as usize * 4;
        let mut luma = Vec::with_capacity((w * h) as usize);
        for row in pixels.as_bytes().chunks(row_bytes) {
            let staged = uc_cms::PixelBuffer::from_bytes(row.to_vec(), w as usize, 4).unwrap();
            let out = t.transform_pixels(&staged, w as usize).unwrap();
            luma.extend_from_slice(&out.as_bytes()[..w as usize]);
        }
        assert_eq!(luma.len(), (w * h) as usize);

        let gray_image = GrayImage::from_raw(w, h, luma).unwrap();
        let mut out = toolkit.adopt(Wand::new()).unwrap();
        out.get_mut()
            .unwrap()
            .push(Frame::new(DynamicImage::ImageLuma8(gray_image)));
        out.get().unwrap().write(&dst).unwrap();

        let mut back = toolkit.new_wand().unwrap();
        back.get_mut().unwrap().load(&dst).unwrap();
        let back = back.get().unwrap();
        assert_eq!(back.colorspace().as_str(), "GRAYColorspace");
        assert!(matches!(
            back.image_type(),
            ImageType::Grayscale | ImageType::Palette | ImageType::Bilevel
        ));
        toolkit.terminus();
    }

    /// Strided bitmap regions survive a staging round trip untouched.
    #[test]
    fn test_staging_keeps_row_padding() {
        let (w, h, bpp, stride) = (3usize, 2usize, 4usize, 16usize);
        let mut image = vec![0xAAu8; stride * h];
        for y in 0..h {
            for x in 0..w {
                let at = y * stride + x * bpp;
                image[at..at + bpp].copy_from_slice(&[200, 30, 30, 255]);
            }
        }

        let srgb = Profile::srgb();
        let t = transform(&srgb, PixelMode::Rgba, &srgb, PixelMode::Rgba);
        let pixels = uc_cms::pixels_from_image(&image, stride, w, h, bpp).unwrap();
        let mut staged = Vec::new();
        for row in pixels.as_bytes().chunks(w * bpp) {
            let buf = uc_cms::PixelBuffer::from_bytes(row.to_vec(), w, bpp).unwrap();
            staged.extend_from_slice(t.transform_pixels(&buf, w).unwrap().as_bytes());
        }
        let staged = uc_cms::PixelBuffer::from_bytes(staged, w, bpp).unwrap();
        uc_cms::set_image_pixels(&staged, &mut image, stride, w, h, bpp).unwrap();

        for y in 0..h {
            let pad = &image[y * stride + w * bpp..(y + 1) * stride];
            assert!(pad.iter().all(|&b| b == 0xAA));
            let px = &image[y * stride..y * stride + bpp];
            assert!(px[0].abs_diff(200) <= 1);
            assert!(px[1].abs_diff(30) <= 1);
        }
    }

    #[test]
    fn test_short_buffers_are_rejected() {
        let srgb = Profile::srgb();
        let t = transform(&srgb, PixelMode::Rgba, &srgb, PixelMode::Rgba);
        let buf = uc_cms::PixelBuffer::from_bytes(vec![0; 8], 2, 4).unwrap();
        assert!(matches!(
            t.transform_pixels(&buf, 3),
            Err(uc_cms::CmsError::BufferSize { .. })
        ));
        assert!(uc_cms::pixels_from_image(&[0; 10], 4, 2, 2, 4).is_err());
    }

    #[test]
    fn test_profile_handles() {
        let handle = Handle::new(Profile::srgb());
        assert_eq!(handle.kind(), "cmsHPROFILE");
        let bytes = handle.get().to_bytes().unwrap();
        let reopened = Handle::try_new(Profile::from_bytes(&bytes).ok()).unwrap();
        assert!(reopened.get().is_rgb());
        assert!(Handle::<Profile>::try_new(None).is_err());
    }

    /// Wands from before a restart are stale; new ones work.
    #[test]
    fn test_toolkit_restart() {
        let toolkit = Toolkit::isolated();
        toolkit.genesis();
        let mut old = toolkit.new_wand().unwrap();
        old.get_mut().unwrap().push(Frame::new(gradient()));
        toolkit.terminus();
        toolkit.genesis();

        assert!(old.get().is_err());
        let fresh = toolkit.new_wand().unwrap();
        assert!(fresh.get().unwrap().is_empty());
        drop(old);
        assert_eq!(toolkit.subsystem().live_resources(), 1);
        toolkit.terminus();
    }

    #[test]
    fn test_flatten_then_blob() {
        let toolkit = Toolkit::isolated();
        toolkit.genesis();
        let mut guarded = toolkit.new_wand().unwrap();
        let wand = guarded.get_mut().unwrap();
        let mut a = Frame::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            Rgba([255, 0, 0, 255]),
        )));
        a.left = 2;
        let b = Frame::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            2,
            6,
            Rgba([0, 0, 255, 255]),
        )));
        wand.push(a);
        wand.push(b);

        let merged = wand.merge_layers().unwrap();
        assert_eq!(wand.position(), 0);
        let merged = toolkit.adopt(merged).unwrap();
        let flat = merged.get().unwrap();
        assert_eq!(flat.len(), 1);
        let frame = flat.current().unwrap();
        assert_eq!((frame.image.width(), frame.image.height()), (6, 6));

        let blob = flat.blob().unwrap();
        let mut reloaded = Wand::new();
        reloaded.load_blob(&blob).unwrap();
        assert_eq!(reloaded.len(), 1);
        toolkit.terminus();
    }

    #[test]
    fn test_settings_yaml_feeds_fonts() {
        let yaml = "text:\n  dpi: 72.0\n  default_font: \"Serif Bold 10\"\n\
                    img:\n  jpeg_quality: 75\n";
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.img.jpeg_quality, 75);
        assert_eq!(settings.img.blob_format, "PNG");
        assert_eq!(settings.cms.alarm_codes, [255, 0, 255]);

        let fd = FontDescription::parse(&settings.text.default_font);
        assert_eq!(fd.weight(), 700);
        let size = fd.size().unwrap();
        assert_eq!(size, FontSize::Points(10.0));
        assert_abs_diff_eq!(size.to_pixels(settings.text.dpi), 10.0);

        let again = Settings::from_yaml(&settings.to_yaml().unwrap()).unwrap();
        assert_eq!(again, settings);
    }

    #[test]
    fn test_settings_file_lookup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("uc2.yaml");
        std::fs::write(&path, "cms:\n  intent: 1\n").unwrap();
        let settings = Settings::lookup(Some(path.as_path())).unwrap();
        assert_eq!(settings.cms.intent, 1);
        assert!(Intent::from_code(settings.cms.intent).is_ok());
        let missing = dir.path().join("missing.yaml");
        assert!(Settings::lookup(Some(missing.as_path())).is_err());
    }

    /// A shaped layout satisfies the structural guarantees of the extractor.
    #[test]
    fn test_layout_cluster_structure() {
        let mut layout = Layout::new();
        layout.set_markup("<b>Hello</b> <i>world</i>").unwrap();
        layout.set_alignment_code(1);
        let n = layout.char_count();
        assert_eq!(n, 11);

        let out = layout.cluster_positions(n).unwrap();
        assert!(!out.glyphs.is_empty());
        assert!(out.glyphs.len() <= n);
        assert_eq!(out.cluster_ranges.len(), out.byte_ranges.len());
        for range in &out.cluster_ranges {
            assert!(range.start < range.end && range.end <= n);
        }
        assert!(out.glyphs.iter().all(|g| g.index < layout.text().len()));
        assert!(!out.directions.base_rtl);

        let chars = layout.char_positions(n).unwrap();
        assert_eq!(chars.len(), n);
        assert!(matches!(
            layout.char_positions(n + 1),
            Err(TextError::PositionsOutOfRange { .. })
        ));
    }

    /// Hand-built right-aligned paragraph: every box shifts by the full width.
    #[test]
    fn test_right_aligned_paragraph_shift() {
        const U: i32 = 1024;
        let para = ParagraphBuilder::new("ab")
            .alignment(Alignment::Right)
            .line(20 * U, 15 * U)
            .cluster(0, 1, 8 * U)
            .cluster(1, 1, 12 * U)
            .build();
        let out = cluster_positions(&para, 2).unwrap();
        assert_abs_diff_eq!(out.glyphs[0].x, -20.0);
        assert_abs_diff_eq!(out.glyphs[1].x, -12.0);
        assert_abs_diff_eq!(out.glyphs[0].baseline, 0.0);
        assert!(!out.directions.mixed);
    }
}
