use oiwvf::{
    builders::OpticsBuilder,
    diffraction::{airy, airy_argument, airy_fwhm, diffraction_limited_mtf, first_null_radius},
    engine::WorkingGrid,
    match_sampling,
    optics::ModelKind,
    otf::CustomOtf,
    units::LengthUnits,
    ApplicationEngine, Builder, FromBuilder, OpticalModel, Optics, OpticsError, PadPolicy,
    PsfStack, SpectralImage, WavefrontSpec,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn bars(height: usize, width: usize) -> anyhow::Result<SpectralImage> {
    Ok(SpectralImage::from_fn(
        height,
        width,
        vec![450f64.nm(), 550f64.nm(), 650f64.nm()],
        2f64.um(),
        |_, j, k| if (j / 3) % 2 == 0 { 1e3 * (k + 1) as f64 } else { 0. },
    )?)
}

#[test]
fn otf_unit_dc() -> anyhow::Result<()> {
    init();
    let spec = WavefrontSpec::builder()
        .wavelengths(vec![450f64.nm(), 550f64.nm(), 650f64.nm()])
        .zernike(vec![0., 0., 0., 0.05, 0.1, -0.05])
        .sampling(12f64.mm(), 128)
        .build()?;
    let otf = spec.compute_otf(None)?;
    assert_eq!(otf.convention(), "DC-at-origin");
    for o in otf.iter() {
        assert!((o.dc() - 1.).norm() < 1e-12);
    }
    let centered = otf.into_centered();
    for o in centered.iter() {
        assert!((o.dc() - 1.).norm() < 1e-12);
        assert!(o.mtf().iter().all(|m| *m <= 1. + 1e-9));
    }
    Ok(())
}

#[test]
fn zero_padding_never_creates_flux() -> anyhow::Result<()> {
    init();
    for kind in ["diffraction-limited", "human"] {
        let optics = Optics::builder()
            .model(kind.parse::<ModelKind>()?.into())
            .pad(PadPolicy::Zero)
            .build()?;
        let mut image = bars(40, 40)?;
        let before: Vec<f64> = (0..3).map(|k| image.band_photons(k)).collect();
        optics.compute(&mut image)?;
        for (k, b) in before.into_iter().enumerate() {
            assert!(image.band_photons(k) <= b * (1. + 1e-9), "{kind}: band #{k}");
        }
    }
    Ok(())
}

#[test]
fn skip_is_identity() -> anyhow::Result<()> {
    init();
    let optics = Optics::builder()
        .model("skip".parse::<ModelKind>()?.into())
        .build()?;
    let mut image = bars(16, 24)?;
    let original = image.photons().clone();
    optics.compute(&mut image)?;
    assert_eq!(image.photons(), &original);
    Ok(())
}

#[test]
fn unsupported_tokens() {
    assert!(matches!(
        "zemax".parse::<ModelKind>(),
        Err(OpticsError::UnsupportedModel(_))
    ));
    assert!(matches!(
        "wrap".parse::<PadPolicy>(),
        Err(OpticsError::UnsupportedPadPolicy(_))
    ));
}

#[test]
fn fwhm_inversely_proportional_to_pupil() -> anyhow::Result<()> {
    init();
    let (f, pitch, n) = (17f64.mm(), 0.25f64.um(), 512);
    for wavelength in [450f64.nm(), 650f64.nm()] {
        let fwhm: Vec<f64> = [2f64.mm(), 4f64.mm()]
            .into_iter()
            .map(|d| -> anyhow::Result<f64> {
                let spec = WavefrontSpec::builder()
                    .pupil_diameter(d)
                    .focal_length(f)
                    .wavelengths(vec![wavelength])
                    .build()?;
                let psf = match_sampling(&spec, pitch, n, 550f64.nm())?.compute_psf(None)?;
                let measured = psf.kernels()[0].fwhm_length().in_micrometers();
                let expected = airy_fwhm(wavelength, f, d)?.in_micrometers();
                assert!(
                    (measured / expected - 1.).abs() < 0.1,
                    "{wavelength} {d}: {measured} vs {expected}"
                );
                Ok(measured)
            })
            .collect::<anyhow::Result<_>>()?;
        let ratio = fwhm[0] / fwhm[1];
        assert!((ratio - 2.).abs() < 0.1, "{wavelength}: {ratio}");
    }
    Ok(())
}

#[test]
fn non_square_image() -> anyhow::Result<()> {
    init();
    let grid = WorkingGrid::new(64, 48, 0.125);
    assert_eq!(grid.col_pad, (8, 8));
    let grid = WorkingGrid::new(64, 47, 0.125);
    assert_eq!(grid.col_pad, (8, 9));
    assert_eq!(grid.size % 2, 0);
    for pad in [PadPolicy::Zero, PadPolicy::Mean, PadPolicy::Replicate] {
        let optics = Optics::builder().pad(pad).build()?;
        let mut image = bars(64, 48)?;
        optics.compute(&mut image)?;
        assert_eq!(image.shape(), (64, 48, 3));
        let mut image = bars(47, 64)?;
        optics.compute(&mut image)?;
        assert_eq!(image.shape(), (47, 64, 3));
    }
    Ok(())
}

#[test]
fn airy_pattern_on_the_image_grid() -> anyhow::Result<()> {
    init();
    let (d, f, wavelength, pitch) = (3f64.mm(), 17f64.mm(), 550f64.nm(), 2f64.um());
    let spec = WavefrontSpec::builder()
        .pupil_diameter(d)
        .focal_length(f)
        .wavelengths(vec![wavelength])
        .build()?;
    let matched = match_sampling(&spec, pitch, 128, wavelength)?;
    let psf = matched.compute_psf(None)?;
    let kernel = psf.get(wavelength).unwrap();
    let ((i, j), peak) = kernel.peak();
    assert_eq!((i, j), (64, 64));
    assert!((kernel.spacing().in_micrometers() - 2.).abs() < 1e-9);
    let profile: Vec<f64> = kernel.profile().into_iter().map(|x| x / peak).collect();
    for r in 0..4 {
        let x = airy_argument(pitch * r as f64, wavelength, f, d);
        assert!(
            (profile[r] - airy(x)).abs() < 0.02,
            "r={r}: {} vs {}",
            profile[r],
            airy(x)
        );
    }
    assert!(profile[2] < 0.01);
    // first dark ring at ~1.9 samples from the peak
    assert!(profile[2] < profile[1] && profile[2] < profile[3]);
    let null = first_null_radius(wavelength, f, d) / pitch;
    assert!((1.5..2.5).contains(&null), "{null}");
    Ok(())
}

#[test]
fn diffraction_limited_transfer_function() -> anyhow::Result<()> {
    init();
    let (d, f, wavelength) = (3f64.mm(), 17f64.mm(), 550f64.nm());
    let spec = WavefrontSpec::builder()
        .pupil_diameter(d)
        .focal_length(f)
        .wavelengths(vec![wavelength])
        .build()?;
    let otf = match_sampling(&spec, 0.5f64.um(), 256, wavelength)?
        .compute_otf(None)?
        .into_centered();
    let otf = otf.get(wavelength).unwrap();
    let step = otf.frequency_step();
    for k in [5, 10, 21, 30, 40] {
        let frequency = k as f64 * step;
        let value = otf.value_at(frequency, 0.).unwrap();
        let expected = diffraction_limited_mtf(frequency, wavelength, f, d);
        assert!(
            (value.norm() - expected).abs() < 0.02,
            "{frequency}: {} vs {expected}",
            value.norm()
        );
    }
    Ok(())
}

#[test]
fn delta_kernel_identity() -> anyhow::Result<()> {
    init();
    let mut image = bars(30, 20)?;
    let original = image.clone();
    let engine = ApplicationEngine::new(PadPolicy::Mean);
    let size = engine.working_grid(&image).size;
    let psf = PsfStack::delta(image.wavelengths(), image.pitch(), size)?;
    engine.apply(&mut image, &psf)?;
    for (a, b) in image.photons().iter().zip(original.photons()) {
        assert!((a - b).abs() < 1e-8);
    }
    Ok(())
}

#[test]
fn dispatcher_models() -> anyhow::Result<()> {
    init();
    let models = [
        OpticalModel::default(),
        OpticalModel::ShiftInvariant {
            wavefront: WavefrontSpec::builder().zernike(vec![0., 0., 0., 0.1, 0.05]),
            fit_modes: None,
            otf: None,
        },
        "human".parse::<ModelKind>()?.into(),
    ];
    for model in models {
        let kind = model.kind();
        let optics = Optics::builder().model(model).build()?;
        let mut image = bars(32, 32)?;
        optics.compute(&mut image)?;
        let otf = image.otf().unwrap();
        assert_eq!(otf.wavelengths(), image.wavelengths().to_vec(), "{kind}");
        let centered = otf.clone().into_centered();
        assert_eq!(&centered.into_origin(), otf);
    }
    Ok(())
}

#[test]
fn custom_otf_on_the_image_grid() -> anyhow::Result<()> {
    init();
    let human = Optics::builder()
        .model("human".parse::<ModelKind>()?.into())
        .build()?;
    let image = bars(32, 32)?;
    let otf = human.otf(&image)?.unwrap().into_centered();
    let custom = Optics::builder()
        .model(OpticalModel::ShiftInvariant {
            wavefront: Default::default(),
            fit_modes: None,
            otf: Some(CustomOtf::new(&otf)?),
        })
        .build()?;
    let (mut a, mut b) = (image.clone(), image);
    human.compute(&mut a)?;
    custom.compute(&mut b)?;
    let peak = a.photons().fold(0f64, |m, x| m.max(*x));
    for (a, b) in a.photons().iter().zip(b.photons()) {
        assert!((a - b).abs() < 1e-9 * peak, "{a} vs {b}");
    }
    Ok(())
}

#[test]
fn optics_from_toml() -> anyhow::Result<()> {
    init();
    let path = std::env::temp_dir().join("oiwvf-optics.toml");
    let builder = Optics::builder()
        .model("human".parse::<ModelKind>()?.into())
        .pad(PadPolicy::Replicate);
    builder.save(&path)?;
    let optics = OpticsBuilder::load(&path)?.build()?;
    assert_eq!(optics, builder.build()?);
    let mut image = bars(24, 24)?;
    optics.compute(&mut image)?;
    assert!(image.otf().is_some());
    Ok(())
}
