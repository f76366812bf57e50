//! Per-camera underwater effect
//!
//! Owns the whole per-frame pipeline for one camera: target pool, boundary
//! and mask passes, artifact correction, and the final compositing blit.
//! The effect is an explicit state machine driven by the caller's render
//! loop; it registers nothing with any global event system.
//!
//! States: `Uninitialized` until [`UnderwaterEffect::setup`] validates the
//! configuration, then `Active`. A configuration error disables the effect
//! permanently; disabled or bypassed frames still produce the destination
//! image via a pass-through blit.

use crate::config::UnderwaterConfig;
use crate::render::api::{
    ComputeDispatch, DrawEncoder, RenderBackend, TargetAllocator, TargetFormat, TargetHandle,
};
use crate::render::primitives::CameraView;
use crate::render::resources::{
    AmbientRefresh, AmbientSnapshot, AmbientSource, Material, MaterialKeywords, TargetPool,
};
use crate::render::systems::underwater::artifacts::ArtifactCorrector;
use crate::render::systems::underwater::boundary::{
    apply_mode_keywords, render_boundary, BoundaryGeometry,
};
use crate::render::systems::underwater::mask::populate_mask;
use crate::render::systems::underwater::tiles::{SurfaceTileSet, TileKey};
use crate::render::systems::underwater::{param, MaskOutputs};
use crate::render::{RenderError, RenderResult};

/// Lifecycle state of the per-camera effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    /// Created but not yet validated
    Uninitialized,
    /// Validated; the pipeline runs every frame
    Active,
    /// A configuration error was detected; frames pass through unmodified
    Disabled,
}

/// Materials the effect needs, created by the caller from its shader set
///
/// A `None` here means the corresponding shader could not be built, which
/// is a non-recoverable configuration error for this camera.
#[derive(Debug, Default)]
pub struct UnderwaterMaterials {
    /// Mask material with the surface and horizon passes
    pub mask: Option<Material>,
    /// Boundary depth material; required for every non-full-screen mode
    pub boundary: Option<Material>,
    /// Compositor material applying the underwater treatment
    pub compositor: Option<Material>,
}

/// Per-camera underwater masking and compositing effect
#[derive(Debug)]
pub struct UnderwaterEffect {
    state: EffectState,
    config: UnderwaterConfig,
    pool: TargetPool,
    corrector: ArtifactCorrector,
    mask_material: Option<Material>,
    boundary_material: Option<Material>,
    compositor_material: Option<Material>,
    ambient: Option<AmbientSnapshot>,
    ambient_dirty: bool,
    first_render: bool,
    wireframe: bool,
}

impl UnderwaterEffect {
    /// Create an uninitialized effect with the given configuration
    pub fn new(config: UnderwaterConfig) -> Self {
        Self {
            state: EffectState::Uninitialized,
            config,
            pool: TargetPool::new(),
            corrector: ArtifactCorrector::new(),
            mask_material: None,
            boundary_material: None,
            compositor_material: None,
            ambient: None,
            ambient_dirty: false,
            first_render: true,
            wireframe: false,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> EffectState {
        self.state
    }

    /// The active configuration
    pub fn config(&self) -> &UnderwaterConfig {
        &self.config
    }

    /// Signal that wireframe/debug rendering is active; while set, frames
    /// bypass compositing with a pass-through blit
    pub fn set_wireframe(&mut self, active: bool) {
        self.wireframe = active;
    }

    /// Request an ambient re-sample on the next composite (relevant with
    /// [`AmbientRefresh::OnDemand`])
    pub fn request_ambient_refresh(&mut self) {
        self.ambient_dirty = true;
    }

    /// Validate materials and configuration, transitioning to `Active`
    ///
    /// Checks that the required materials exist, that the underwater
    /// feature is compiled into the surface material, and that every
    /// keyword enabled on the compositor material is also enabled on the
    /// surface material (a mismatch makes the underwater appearance diverge
    /// from the surface). Any failure disables the effect permanently.
    pub fn setup(
        &mut self,
        materials: UnderwaterMaterials,
        surface_material: &Material,
        compute: &mut dyn ComputeDispatch,
    ) -> RenderResult<()> {
        match self.state {
            EffectState::Active => return Ok(()),
            EffectState::Disabled => {
                return Err(RenderError::Configuration(
                    "underwater effect is permanently disabled".to_string(),
                ))
            }
            EffectState::Uninitialized => {}
        }

        if let Err(error) = self.config.validate() {
            return Err(self.disable(format!("invalid configuration: {error}")));
        }

        let Some(mask) = materials.mask else {
            return Err(self.disable("mask material is missing".to_string()));
        };
        let Some(compositor) = materials.compositor else {
            return Err(self.disable("compositor material is missing".to_string()));
        };
        if self.config.boundary_mode.uses_geometry() && materials.boundary.is_none() {
            return Err(self.disable(format!(
                "boundary material is required for {:?} mode",
                self.config.boundary_mode
            )));
        }

        if !surface_material.has_keyword(MaterialKeywords::UNDERWATER) {
            return Err(self.disable(format!(
                "underwater feature is not enabled on surface material '{}'",
                surface_material.name()
            )));
        }

        // Keyword parity audit: the compositor must not use features the
        // surface shader was compiled without.
        let missing = compositor.keywords() - surface_material.keywords();
        if !missing.is_empty() {
            for (name, _) in missing.iter_names() {
                log::warn!(
                    "keyword {name} enabled on compositor material '{}' but not on surface material '{}'",
                    compositor.name(),
                    surface_material.name()
                );
            }
            return Err(self.disable(format!(
                "compositor/surface material keyword mismatch: {missing:?}"
            )));
        }

        if let Err(error) = self.corrector.setup(compute) {
            return Err(self.disable(format!("artifact correction unavailable: {error}")));
        }

        self.mask_material = Some(mask);
        self.boundary_material = materials.boundary;
        self.compositor_material = Some(compositor);
        self.first_render = true;
        self.state = EffectState::Active;
        log::info!(
            "underwater effect active ({:?} mode)",
            self.config.boundary_mode
        );
        Ok(())
    }

    /// Build this frame's underwater mask for the camera
    ///
    /// Runs the boundary passes (mode permitting), the horizon and tile
    /// mask passes, and artifact correction, in that order, as one command
    /// sequence on `backend`. Target allocation failure aborts only this
    /// frame; allocation is retried on the next call.
    pub fn render_mask(
        &mut self,
        camera: &CameraView,
        tiles: &mut SurfaceTileSet,
        bind_tile: &mut dyn FnMut(TileKey),
        boundary_geometry: Option<&BoundaryGeometry>,
        surface_material: &mut Material,
        backend: &mut dyn RenderBackend,
    ) -> RenderResult<MaskOutputs> {
        if self.state != EffectState::Active {
            return Err(RenderError::Configuration(
                "underwater effect is not active".to_string(),
            ));
        }

        let (width, height) = camera.viewport;
        let layers = if self.config.single_pass_stereo { 2 } else { 1 };
        let mask_format = if self.config.full_float_mask {
            TargetFormat::R32Float
        } else {
            TargetFormat::R16Float
        };

        let targets = match self
            .pool
            .ensure_mask_targets(backend, width, height, layers, mask_format)
        {
            Ok(targets) => targets,
            Err(error) => {
                log::warn!("skipping underwater mask this frame: {error}");
                return Err(error);
            }
        };

        let mode = self.config.boundary_mode;

        {
            let mut mode_materials: Vec<&mut Material> = Vec::new();
            if let Some(material) = self.mask_material.as_mut() {
                mode_materials.push(material);
            }
            if let Some(material) = self.compositor_material.as_mut() {
                mode_materials.push(material);
            }
            mode_materials.push(surface_material);
            apply_mode_keywords(mode, mode_materials);
        }

        let mut boundary_outputs = None;
        if mode.uses_geometry() {
            let Some(geometry) = boundary_geometry else {
                return Err(
                    self.disable(format!("boundary geometry is required for {mode:?} mode"))
                );
            };
            let Some(boundary_material) = self.boundary_material.as_ref() else {
                return Err(self.disable("boundary material is missing".to_string()));
            };

            boundary_outputs = Some(render_boundary(
                backend,
                &mut self.pool,
                mode,
                geometry,
                boundary_material,
                camera.viewport,
                layers,
                targets.mask_depth,
            )?);
        }

        let Some(mask_material) = self.mask_material.as_mut() else {
            return Err(RenderError::Configuration(
                "mask material is missing".to_string(),
            ));
        };

        // Clear the mask color always; clear depth only when the interior
        // marker pass has not already primed it.
        backend.set_render_target(Some(targets.mask), Some(targets.mask_depth));
        backend.clear(Some(0.0), !mode.primes_mask_depth());

        populate_mask(
            backend,
            camera,
            tiles,
            bind_tile,
            mask_material,
            self.config.far_plane_multiplier,
            self.config.disable_tile_pass,
        )?;

        self.corrector.run(
            backend,
            targets.mask,
            width,
            height,
            self.config.single_pass_stereo,
            self.config.artifact_correction,
        )?;

        Ok(MaskOutputs {
            mask: targets.mask,
            mask_depth: targets.mask_depth,
            boundary_front: boundary_outputs.map(|b| b.front),
            boundary_back: boundary_outputs.and_then(|b| b.back),
        })
    }

    /// Composite the underwater treatment over the source image
    ///
    /// Bypasses to a plain blit when the effect is not active, wireframe
    /// rendering is on, or this frame produced no mask outputs. The
    /// destination is written in every case; the surrounding loop expects a
    /// complete frame no matter what.
    pub fn composite(
        &mut self,
        source: TargetHandle,
        destination: TargetHandle,
        outputs: Option<&MaskOutputs>,
        surface_material: &Material,
        ambient: &mut dyn AmbientSource,
        encoder: &mut dyn DrawEncoder,
    ) -> RenderResult<()> {
        let bypass = self.state != EffectState::Active || self.wireframe || outputs.is_none();
        let Some(outputs) = outputs.filter(|_| !bypass) else {
            encoder.blit(source, destination, None);
            return Ok(());
        };

        if self.config.view_mask {
            encoder.blit(outputs.mask, destination, None);
            self.first_render = false;
            return Ok(());
        }

        let refresh = self.config.ambient_refresh == AmbientRefresh::EveryFrame
            || self.ambient.is_none()
            || self.ambient_dirty;
        if refresh {
            self.ambient = Some(ambient.sample());
            self.ambient_dirty = false;
        }
        let Some(snapshot) = self.ambient else {
            return Err(RenderError::Backend(
                "ambient snapshot unavailable after refresh".to_string(),
            ));
        };

        let Some(compositor) = self.compositor_material.as_mut() else {
            return Err(RenderError::Configuration(
                "compositor material is missing".to_string(),
            ));
        };

        compositor.set_buffer(param::AMBIENT_COEFFICIENTS, snapshot.as_bytes());
        compositor.set_target(param::MASK_TEXTURE, outputs.mask);
        compositor.set_target(param::MASK_DEPTH_TEXTURE, outputs.mask_depth);
        if let Some(front) = outputs.boundary_front {
            compositor.set_target(param::BOUNDARY_FRONT_TEXTURE, front);
        }
        if let Some(back) = outputs.boundary_back {
            compositor.set_target(param::BOUNDARY_BACK_TEXTURE, back);
        }

        if self.first_render || self.config.copy_surface_params_each_frame {
            compositor.copy_float_params_from(surface_material);
        }

        encoder.blit(source, destination, Some(compositor));
        self.first_render = false;
        Ok(())
    }

    /// Release every owned target and return to `Uninitialized`; idempotent
    pub fn teardown(&mut self, alloc: &mut dyn TargetAllocator) {
        self.pool.release_all(alloc);
        self.mask_material = None;
        self.boundary_material = None;
        self.compositor_material = None;
        self.ambient = None;
        self.ambient_dirty = false;
        self.first_render = true;
        self.state = EffectState::Uninitialized;
    }

    fn disable(&mut self, message: String) -> RenderError {
        if self.state != EffectState::Disabled {
            log::error!("underwater effect disabled: {message}");
        }
        self.state = EffectState::Disabled;
        RenderError::Configuration(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::software::{BackendEvent, SoftwareBackend};
    use crate::render::resources::MaterialId;
    use crate::render::systems::underwater::BoundaryMode;

    struct CountingAmbient {
        samples: u32,
    }

    impl AmbientSource for CountingAmbient {
        fn sample(&mut self) -> AmbientSnapshot {
            self.samples += 1;
            AmbientSnapshot::uniform(0.1, 0.2, 0.3)
        }
    }

    fn surface_material() -> Material {
        Material::new(MaterialId(0), "water-surface")
            .with_keyword(MaterialKeywords::UNDERWATER)
            .with_keyword(MaterialKeywords::MENISCUS)
    }

    fn materials() -> UnderwaterMaterials {
        UnderwaterMaterials {
            mask: Some(Material::new(MaterialId(1), "underwater-mask")),
            boundary: Some(Material::new(MaterialId(2), "boundary-depth")),
            compositor: Some(
                Material::new(MaterialId(3), "underwater-compositor")
                    .with_keyword(MaterialKeywords::UNDERWATER),
            ),
        }
    }

    #[test]
    fn setup_activates_with_valid_materials() {
        let mut backend = SoftwareBackend::new();
        let mut effect = UnderwaterEffect::new(UnderwaterConfig::default());

        effect
            .setup(materials(), &surface_material(), &mut backend)
            .unwrap();
        assert_eq!(effect.state(), EffectState::Active);
    }

    #[test]
    fn setup_requires_underwater_feature_on_surface() {
        let mut backend = SoftwareBackend::new();
        let mut effect = UnderwaterEffect::new(UnderwaterConfig::default());
        let plain_surface = Material::new(MaterialId(0), "water-surface");

        assert!(effect
            .setup(materials(), &plain_surface, &mut backend)
            .is_err());
        assert_eq!(effect.state(), EffectState::Disabled);
    }

    #[test]
    fn setup_rejects_keyword_mismatch() {
        let mut backend = SoftwareBackend::new();
        let mut effect = UnderwaterEffect::new(UnderwaterConfig::default());

        let mut mats = materials();
        mats.compositor = Some(
            Material::new(MaterialId(3), "underwater-compositor")
                .with_keyword(MaterialKeywords::UNDERWATER)
                .with_keyword(MaterialKeywords::STEREO_INSTANCING),
        );

        assert!(effect
            .setup(mats, &surface_material(), &mut backend)
            .is_err());
        assert_eq!(effect.state(), EffectState::Disabled);
    }

    #[test]
    fn setup_requires_boundary_material_in_geometry_modes() {
        let mut backend = SoftwareBackend::new();
        let config = UnderwaterConfig {
            boundary_mode: BoundaryMode::Geometry3D,
            ..UnderwaterConfig::default()
        };
        let mut effect = UnderwaterEffect::new(config);

        let mut mats = materials();
        mats.boundary = None;

        assert!(effect
            .setup(mats, &surface_material(), &mut backend)
            .is_err());
        assert_eq!(effect.state(), EffectState::Disabled);
    }

    #[test]
    fn disabled_effect_composites_as_passthrough() {
        let mut backend = SoftwareBackend::new();
        let mut effect = UnderwaterEffect::new(UnderwaterConfig::default());
        let plain_surface = Material::new(MaterialId(0), "water-surface");
        let _ = effect.setup(materials(), &plain_surface, &mut backend);

        let source = TargetHandle(100);
        let destination = TargetHandle(101);
        let mut ambient = CountingAmbient { samples: 0 };

        effect
            .composite(
                source,
                destination,
                None,
                &plain_surface,
                &mut ambient,
                &mut backend,
            )
            .unwrap();

        assert!(backend.events().contains(&BackendEvent::Blit {
            source,
            destination,
            with_material: false,
        }));
        assert_eq!(ambient.samples, 0);
    }

    #[test]
    fn wireframe_forces_passthrough() {
        let mut backend = SoftwareBackend::new();
        let mut effect = UnderwaterEffect::new(UnderwaterConfig::default());
        effect
            .setup(materials(), &surface_material(), &mut backend)
            .unwrap();
        effect.set_wireframe(true);

        let outputs = MaskOutputs {
            mask: TargetHandle(1),
            mask_depth: TargetHandle(2),
            boundary_front: None,
            boundary_back: None,
        };
        let mut ambient = CountingAmbient { samples: 0 };

        effect
            .composite(
                TargetHandle(100),
                TargetHandle(101),
                Some(&outputs),
                &surface_material(),
                &mut ambient,
                &mut backend,
            )
            .unwrap();

        assert!(backend.events().contains(&BackendEvent::Blit {
            source: TargetHandle(100),
            destination: TargetHandle(101),
            with_material: false,
        }));
    }

    #[test]
    fn on_demand_ambient_samples_once_until_requested() {
        let mut backend = SoftwareBackend::new();
        let config = UnderwaterConfig {
            ambient_refresh: AmbientRefresh::OnDemand,
            ..UnderwaterConfig::default()
        };
        let mut effect = UnderwaterEffect::new(config);
        effect
            .setup(materials(), &surface_material(), &mut backend)
            .unwrap();

        let outputs = MaskOutputs {
            mask: TargetHandle(1),
            mask_depth: TargetHandle(2),
            boundary_front: None,
            boundary_back: None,
        };
        let surface = surface_material();
        let mut ambient = CountingAmbient { samples: 0 };

        for _ in 0..3 {
            effect
                .composite(
                    TargetHandle(100),
                    TargetHandle(101),
                    Some(&outputs),
                    &surface,
                    &mut ambient,
                    &mut backend,
                )
                .unwrap();
        }
        assert_eq!(ambient.samples, 1);

        effect.request_ambient_refresh();
        effect
            .composite(
                TargetHandle(100),
                TargetHandle(101),
                Some(&outputs),
                &surface,
                &mut ambient,
                &mut backend,
            )
            .unwrap();
        assert_eq!(ambient.samples, 2);
    }

    #[test]
    fn surface_params_copy_policy() {
        let mut backend = SoftwareBackend::new();
        let config = UnderwaterConfig {
            copy_surface_params_each_frame: false,
            ..UnderwaterConfig::default()
        };
        let mut effect = UnderwaterEffect::new(config);
        effect
            .setup(materials(), &surface_material(), &mut backend)
            .unwrap();

        let outputs = MaskOutputs {
            mask: TargetHandle(1),
            mask_depth: TargetHandle(2),
            boundary_front: None,
            boundary_back: None,
        };
        let mut surface = surface_material();
        surface.set_float("fog_density", 0.25);
        let mut ambient = CountingAmbient { samples: 0 };

        // First composite copies despite the flag.
        effect
            .composite(
                TargetHandle(100),
                TargetHandle(101),
                Some(&outputs),
                &surface,
                &mut ambient,
                &mut backend,
            )
            .unwrap();

        // Later surface edits are not mirrored when copying is off.
        surface.set_float("fog_density", 0.9);
        effect
            .composite(
                TargetHandle(100),
                TargetHandle(101),
                Some(&outputs),
                &surface,
                &mut ambient,
                &mut backend,
            )
            .unwrap();

        let compositor = effect.compositor_material.as_ref().unwrap();
        assert_eq!(compositor.float("fog_density"), Some(0.25));
    }

    #[test]
    fn teardown_returns_to_uninitialized() {
        let mut backend = SoftwareBackend::new();
        let mut effect = UnderwaterEffect::new(UnderwaterConfig::default());
        effect
            .setup(materials(), &surface_material(), &mut backend)
            .unwrap();

        effect.teardown(&mut backend);
        assert_eq!(effect.state(), EffectState::Uninitialized);

        // Idempotent.
        effect.teardown(&mut backend);
        assert_eq!(effect.state(), EffectState::Uninitialized);
    }
}
