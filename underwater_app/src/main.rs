//! Underwater mask demo application
//!
//! Drives the underwater pipeline against the software reference backend:
//! sets up a per-camera effect, renders a scripted sequence of frames
//! through changing viewport resolutions, and logs what the pipeline does
//! (target pool activity, tile binding, mask coverage).

use underwater_engine::prelude::*;
use underwater_engine::render::backends::software::{BackendEvent, SoftwareBackend};
use underwater_engine::render::systems::underwater::param;

/// Slowly shifting ambient term standing in for a real lighting system
struct DemoAmbient {
    frame: u32,
}

impl AmbientSource for DemoAmbient {
    fn sample(&mut self) -> AmbientSnapshot {
        self.frame += 1;
        let t = self.frame as f32 * 0.01;
        AmbientSnapshot::uniform(0.10 + t, 0.18 + t, 0.30 + t)
    }
}

struct UnderwaterDemo {
    backend: SoftwareBackend,
    effect: UnderwaterEffect,
    tiles: SurfaceTileSet,
    surface_material: Material,
    ambient: DemoAmbient,
}

impl UnderwaterDemo {
    fn new() -> RenderResult<Self> {
        let mut backend = SoftwareBackend::new();

        let surface_material = Material::new(MaterialId(0), "water-surface")
            .with_keyword(MaterialKeywords::UNDERWATER)
            .with_keyword(MaterialKeywords::MENISCUS);

        let mut mask_material = Material::new(MaterialId(1), "underwater-mask");
        mask_material.set_float(param::HORIZON_MASK_VALUE, 1.0);

        let materials = UnderwaterMaterials {
            mask: Some(mask_material),
            boundary: None,
            compositor: Some(
                Material::new(MaterialId(2), "underwater-compositor")
                    .with_keyword(MaterialKeywords::UNDERWATER),
            ),
        };

        let mut effect = UnderwaterEffect::new(UnderwaterConfig::default());
        effect.setup(materials, &surface_material, &mut backend)?;

        // A 5x5 grid of surface tiles around the origin.
        let mut tiles = SurfaceTileSet::new();
        for x in -2i32..=2 {
            for z in -2i32..=2 {
                let mesh = backend.create_mesh();
                let center = Vec3::new(x as f32 * 32.0, 0.0, z as f32 * 32.0);
                tiles.insert(SurfaceTile::new(
                    mesh,
                    Aabb::from_center_extents(center, Vec3::new(16.0, 2.0, 16.0)),
                ));
            }
        }
        log::info!("registered {} surface tiles", tiles.len());

        Ok(Self {
            backend,
            effect,
            tiles,
            surface_material,
            ambient: DemoAmbient { frame: 0 },
        })
    }

    fn run_frame(&mut self, frame: usize, viewport: (u32, u32)) -> RenderResult<()> {
        // Viewer slightly below the surface, looking across the tile grid.
        let camera = CameraView::perspective(
            Vec3::new(0.0, -2.0, 60.0),
            Vec3::new(0.0, 0.0, 0.0),
            60.0,
            viewport,
            0.1,
            1000.0,
        );

        self.tiles.begin_frame();
        self.backend.clear_events();

        let mut binds = 0u32;
        let outputs = self.effect.render_mask(
            &camera,
            &mut self.tiles,
            &mut |_| binds += 1,
            None,
            &mut self.surface_material,
            &mut self.backend,
        )?;

        let pool_allocations = self
            .backend
            .events()
            .iter()
            .filter(|e| matches!(e, BackendEvent::Allocate { .. }))
            .count();

        let frame_desc = TargetDesc {
            width: viewport.0,
            height: viewport.1,
            layers: 1,
            format: TargetFormat::R16Float,
            samples: 1,
            random_write: false,
        };
        let source = self.backend.allocate(&frame_desc)?;
        let destination = self.backend.allocate(&frame_desc)?;

        self.effect.composite(
            source,
            destination,
            Some(&outputs),
            &self.surface_material,
            &mut self.ambient,
            &mut self.backend,
        )?;

        let underwater_fraction = self
            .backend
            .texture(outputs.mask)
            .map(|texture| {
                let wet = texture.texels.iter().filter(|t| **t > 0.5).count();
                wet as f32 / texture.texels.len() as f32
            })
            .unwrap_or(0.0);

        log::info!(
            "frame {frame}: {}x{} tile binds={binds} pool allocations={pool_allocations} \
             underwater coverage={:.1}%",
            viewport.0,
            viewport.1,
            underwater_fraction * 100.0
        );

        self.backend.release(source);
        self.backend.release(destination);
        Ok(())
    }

    fn run(&mut self) -> RenderResult<()> {
        let resolutions = [(1920, 1080), (1920, 1080), (2560, 1440), (1920, 1080)];
        for (frame, viewport) in resolutions.into_iter().enumerate() {
            self.run_frame(frame, viewport)?;
        }

        self.effect.teardown(&mut self.backend);
        log::info!(
            "teardown complete, live targets remaining: {}",
            self.backend.live_target_count()
        );
        Ok(())
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("underwater mask demo starting");
    let result = UnderwaterDemo::new().and_then(|mut demo| demo.run());
    if let Err(error) = result {
        log::error!("demo failed: {error}");
        std::process::exit(1);
    }
    log::info!("underwater mask demo finished");
}
