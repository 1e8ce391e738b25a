//! Demo scene: a walled room with a stone floor and scattered ore
//!
//! Floor material and light are dense per-chunk values. Walls and ore are
//! cell entities that point at shared prototype entities for their glyph
//! and name.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_core::{BlockPos, BlockRegion};
use strata_ecs::{ComponentEvent, Entity, EntityBuilder, LookupMode, Prototype};
use strata_world::{ChunkManager, DenseHandle};
use tracing::{debug, info};

use crate::settings::SceneSettings;

/// Dense block material. `Air` is the empty default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Material {
    #[default]
    Air,
    Stone,
    Ore,
}

/// Dense block light level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Light(pub u8);

/// How a block is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph(pub char);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

/// Counts of what the scene built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub chunks: usize,
    pub entities: usize,
    pub floor_blocks: usize,
    pub wall_blocks: usize,
    pub ore_blocks: usize,
    pub lit_blocks: usize,
    pub prototype_links: usize,
}

pub struct Scene {
    pub grid: ChunkManager,
    pub region: BlockRegion,
    pub wall: Entity,
    pub ore: Entity,
    materials: DenseHandle<Material>,
    lights: DenseHandle<Light>,
    links: Rc<Cell<usize>>,
}

impl Scene {
    pub fn build(settings: &SceneSettings) -> Result<Self> {
        let region = settings.region()?;
        let ore_chance = settings.ore_chance();
        let mut rng = StdRng::seed_from_u64(settings.seed);

        let mut grid = ChunkManager::new();
        let materials = grid.register_dense::<Material>()?;
        let lights = grid.register_dense::<Light>()?;

        let links = Rc::new(Cell::new(0));
        let counter = links.clone();
        grid.world_mut().on_component::<Prototype>(move |_, event| {
            if matches!(event, ComponentEvent::Added { .. }) {
                counter.set(counter.get() + 1);
            }
        });

        let world = grid.world_mut();
        let wall = EntityBuilder::new()
            .with(Glyph('#'))
            .with(Name("wall".into()))
            .spawn(world)?;
        let ore = EntityBuilder::new()
            .with_prototype(wall)
            .with(Glyph('*'))
            .with(Name("ore vein".into()))
            .spawn(world)?;

        let min = region.min();
        let max = region.max();
        for pos in region.blocks() {
            let on_edge =
                pos.x == min.x || pos.x == max.x - 1 || pos.y == min.y || pos.y == max.y - 1;
            if pos.z == min.z {
                let material = if !on_edge && rng.gen_bool(ore_chance) {
                    grid.set_block(pos, Some(Prototype::new(ore)))?;
                    Material::Ore
                } else {
                    Material::Stone
                };
                grid.set_block(pos, Some(material))?;
            } else if on_edge {
                grid.set_block(pos, Some(Prototype::new(wall)))?;
            } else {
                let light = (pos.z - min.z).clamp(0, 15) as u8;
                grid.set_block(pos, Some(Light(light)))?;
            }
        }
        debug!("filled {} ({} blocks)", region, region.volume());

        Ok(Self {
            grid,
            region,
            wall,
            ore,
            materials,
            lights,
            links,
        })
    }

    /// Scan the scene and count what it holds.
    pub fn stats(&self) -> Result<SceneStats> {
        let world = self.grid.world();
        let mut stats = SceneStats {
            chunks: self.grid.chunk_count(),
            entities: world.entity_count(),
            prototype_links: self.links.get(),
            ..Default::default()
        };

        for (_, chunk) in self.grid.chunks() {
            if let Some(array) = self.materials.get(world, chunk)? {
                stats.floor_blocks += array.non_default_count();
            }
            if let Some(array) = self.lights.get(world, chunk)? {
                stats.lit_blocks += array.non_default_count();
            }
        }

        // placed blocks inherit their name; the templates themselves do not count
        for (entity, name) in world.entries::<Name>(LookupMode::All) {
            if entity == self.wall || entity == self.ore {
                continue;
            }
            match name.0.as_str() {
                "wall" => stats.wall_blocks += 1,
                "ore vein" => stats.ore_blocks += 1,
                _ => {}
            }
        }
        Ok(stats)
    }

    /// The glyph drawn for the block at `pos`, if any.
    pub fn glyph_at(&self, pos: BlockPos) -> Result<Option<char>> {
        Ok(self.grid.get_block::<Glyph>(pos)?.map(|glyph| glyph.0))
    }

    pub fn log_summary(&self) -> Result<()> {
        let stats = self.stats()?;
        info!(
            "scene {}: {} chunks, {} entities",
            self.region, stats.chunks, stats.entities
        );
        info!(
            "{} floor blocks ({} ore), {} wall blocks, {} lit blocks",
            stats.floor_blocks, stats.ore_blocks, stats.wall_blocks, stats.lit_blocks
        );
        let world = self.grid.world();
        let from_wall = world.derived_of(self.wall)?.map_or(0, |derived| derived.len());
        let from_ore = world.derived_of(self.ore)?.map_or(0, |derived| derived.len());
        info!(
            "{} prototype links made: {} derive from the wall, {} from the ore",
            stats.prototype_links, from_wall, from_ore
        );
        Ok(())
    }
}
