//! # Game State Module
//!
//! The turn controller: owner of every simulation system and the only thing
//! that mutates them.
//!
//! A tick either resolves one discrete step instantly (player move, then every
//! creature's action) and starts the animation clock, or advances the running
//! animation. Never both. Post-move hooks run exactly once when an animation
//! completes.

use crate::generation::utils::create_rng;
use crate::{
    generate_chunk, generate_floor, AnimationClock, CameraShake, ChunkBuilder, ChunkCoord,
    ChunkProperties, ChunkShape, ClockStep, Command, DamageResult, DebugToggles, DelveError,
    DelveResult, DoorState, Entity, EntityId, EntityKind, EntityRegistry, FloorPlan,
    GameStatistics, Inventory, ItemCatalog, LootBook, MoveOutcome, MoveQueue, Palette,
    PathfindingGrid, Position, SimulationConfig, TemplateBook, TickOutcome, World, DAMAGE_SHAKE,
    PLAYER_SUBTYPE,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;

/// Central simulation state.
///
/// Owns the chunk store, entity registry, floor plan and pathfinding window,
/// together with the move queue and animation clock that pace them.
///
/// # Examples
///
/// ```
/// use delve::{Command, GameState, SimulationConfig, TickOutcome};
///
/// let mut state = GameState::new(SimulationConfig::new(42)).unwrap();
/// assert!(state.player_position().is_some());
/// assert_eq!(state.tick(16, &[Command::Wait]), TickOutcome::Continue);
/// assert_eq!(state.tick(16, &[Command::Exit]), TickOutcome::Quit);
/// ```
#[derive(Debug, Clone)]
pub struct GameState {
    /// Generated chunks and their tiles
    pub world: World,
    /// Every live entity, the player included
    pub entities: EntityRegistry,
    /// Player-centred cost window shared by every pathing creature
    pub pathfinding: PathfindingGrid,
    config: SimulationConfig,
    floor: FloorPlan,
    rng: StdRng,
    templates: TemplateBook,
    loot: LootBook,
    catalog: ItemCatalog,
    inventory: Inventory,
    debug: DebugToggles,
    camera_shake: CameraShake,
    statistics: GameStatistics,
    move_queue: MoveQueue,
    clock: AnimationClock,
    player_id: Option<EntityId>,
    wait_requested: bool,
    pending_door_reveal: Option<Position>,
    hooks_run: u64,
}

impl GameState {
    /// Plans a floor, generates the starting chunk, places the player and
    /// reveals the starting room.
    pub fn new(config: SimulationConfig) -> DelveResult<Self> {
        Self::with_tables(
            config,
            TemplateBook::default(),
            LootBook::default(),
            ItemCatalog::default(),
        )
    }

    /// Like [`GameState::new`] with caller-supplied data tables.
    pub fn with_tables(
        config: SimulationConfig,
        templates: TemplateBook,
        loot: LootBook,
        catalog: ItemCatalog,
    ) -> DelveResult<Self> {
        templates.validate()?;
        let mut rng = create_rng(&config.generation);
        let floor = generate_floor(&config.generation, &mut rng)?;
        info!(
            "planned floor for seed {}: {} chunks, start ({}, {})",
            config.seed,
            floor.chunk_count(),
            floor.start_chunk().x,
            floor.start_chunk().y
        );

        let mut state = Self::assemble(config, floor, rng)
            .with_templates(templates)
            .with_loot(loot)
            .with_catalog(catalog);
        state.start()?;
        Ok(state)
    }

    /// Starts a simulation on an already planned floor.
    pub fn with_floor(config: SimulationConfig, floor: FloorPlan) -> DelveResult<Self> {
        let rng = create_rng(&config.generation);
        let mut state = Self::assemble(config, floor, rng);
        state.start()?;
        Ok(state)
    }

    /// An empty simulation: chunk `(0, 0)` is planned but nothing is generated
    /// and there is no player.
    pub fn blank(config: SimulationConfig) -> Self {
        let floor = FloorPlan::single(
            ChunkProperties {
                shape: ChunkShape::Classic,
                palette: Palette::Slate,
            },
            Position::origin(),
        );
        let rng = create_rng(&config.generation);
        Self::assemble(config, floor, rng)
    }

    pub fn with_templates(mut self, templates: TemplateBook) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_loot(mut self, loot: LootBook) -> Self {
        self.loot = loot;
        self
    }

    pub fn with_catalog(mut self, catalog: ItemCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    fn assemble(config: SimulationConfig, floor: FloorPlan, rng: StdRng) -> Self {
        Self {
            world: World::new(),
            entities: EntityRegistry::new(),
            pathfinding: PathfindingGrid::new(
                config.pathfinding_width,
                config.pathfinding_height,
                config.pathfinding_deadzone,
            ),
            floor,
            rng,
            templates: TemplateBook::default(),
            loot: LootBook::default(),
            catalog: ItemCatalog::default(),
            inventory: Inventory::new(),
            debug: config.debug,
            camera_shake: CameraShake::new(),
            statistics: GameStatistics::default(),
            move_queue: MoveQueue::new(config.max_queued_moves),
            clock: AnimationClock::new(config.animation_length_ms),
            player_id: None,
            wait_requested: false,
            pending_door_reveal: None,
            hooks_run: 0,
            config,
        }
    }

    fn start(&mut self) -> DelveResult<()> {
        self.materialize_chunk(self.floor.start_chunk())?;
        let spawn = self.find_starting_position()?;
        self.spawn_player(spawn)?;
        self.reveal(spawn);
        info!(
            "simulation ready: player at ({}, {}), {} entities",
            spawn.x,
            spawn.y,
            self.entities.len()
        );
        Ok(())
    }

    /// Throws the floor away and starts over on the next seed.
    ///
    /// Debug toggles carry over.
    pub fn reset_for_new_game(&mut self) -> DelveResult<()> {
        let mut config = self.config.clone();
        config.seed = config.seed.wrapping_add(1);
        config.generation.seed = config.seed;
        config.debug = self.debug;
        info!("restarting on seed {}", config.seed);

        let templates = self.templates.clone();
        let loot = self.loot.clone();
        let catalog = self.catalog.clone();
        *self = Self::with_tables(config, templates, loot, catalog)?;
        Ok(())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn floor(&self) -> &FloorPlan {
        &self.floor
    }

    pub fn templates(&self) -> &TemplateBook {
        &self.templates
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player_id
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player_id.and_then(|id| self.entities.get(id))
    }

    pub fn player_position(&self) -> Option<Position> {
        self.player().map(|player| player.position)
    }

    /// Whether there is a player and it is still alive.
    pub fn player_alive(&self) -> bool {
        self.player().is_some_and(|player| player.living)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn statistics(&self) -> &GameStatistics {
        &self.statistics
    }

    pub fn debug(&self) -> DebugToggles {
        self.debug
    }

    pub fn camera_shake(&self) -> &CameraShake {
        &self.camera_shake
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn move_queue(&self) -> &MoveQueue {
        &self.move_queue
    }

    /// Number of times the post-move hooks have run.
    pub fn hooks_run(&self) -> u64 {
        self.hooks_run
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Everything standing on a tile.
    pub fn what_is_at(&self, position: Position) -> Vec<&Entity> {
        self.entities.entities_at(position)
    }

    /// Generates a planned chunk into the world.
    ///
    /// Fails if the chunk is not part of the floor plan or already exists.
    pub fn materialize_chunk(&mut self, chunk: ChunkCoord) -> DelveResult<()> {
        if self.world.chunk_exists(chunk) {
            return Err(DelveError::InvalidState(format!(
                "chunk ({}, {}) already generated",
                chunk.x, chunk.y
            )));
        }
        let mut builder = ChunkBuilder {
            world: &mut self.world,
            entities: &mut self.entities,
            floor: &self.floor,
            templates: &self.templates,
            config: &self.config.generation,
            rng: &mut self.rng,
            visible: self.debug.reveal_generated,
        };
        generate_chunk(&mut builder, chunk)?;
        self.statistics.chunks_generated += 1;
        debug!(
            "materialized chunk ({}, {}); {} chunks, {} entities",
            chunk.x,
            chunk.y,
            self.world.chunk_count(),
            self.entities.len()
        );
        Ok(())
    }

    /// The spawn point from the floor plan, or the nearest tile to it if
    /// generation carved the spawn point away.
    pub fn find_starting_position(&self) -> DelveResult<Position> {
        let preferred = self.floor.spawn_position();
        if self.world.has_tile(preferred) {
            return Ok(preferred);
        }
        self.world
            .iter_tiles()
            .map(|(pos, _)| pos)
            .min_by_key(|pos| (pos.manhattan_distance(preferred), pos.y, pos.x))
            .ok_or_else(|| DelveError::GenerationFailed("no floor tile to spawn on".to_string()))
    }

    /// Places the player, removing anything already on the tile without drops.
    pub fn spawn_player(&mut self, position: Position) -> DelveResult<EntityId> {
        if !self.world.has_tile(position) {
            return Err(DelveError::InvalidAction(format!(
                "cannot spawn the player in the void at ({}, {})",
                position.x, position.y
            )));
        }
        if let Some(old) = self.player_id.take() {
            self.entities.remove(old);
        }
        let cleared = self.entities.clear_at(position);
        if cleared > 0 {
            debug!("cleared {} entities from the spawn tile", cleared);
        }

        let id = self
            .entities
            .spawn_creature(&self.templates, PLAYER_SUBTYPE, position, true);
        if let Some(player) = self.entities.get_mut(id) {
            player.hp = self.config.player_health;
        }
        self.player_id = Some(id);
        self.pathfinding
            .rebuild(&self.world, &self.entities, position);
        Ok(id)
    }

    /// Resolves one step of an entity by `delta`.
    ///
    /// Void and closed doors block (only the player opens doors), damageable
    /// occupants are attacked with a bump, anything else is walked onto.
    pub fn attempt_move(&mut self, id: EntityId, delta: Position) -> DelveResult<MoveOutcome> {
        let mover = self.entities.require(id)?;
        if !mover.living {
            return Ok(MoveOutcome::Blocked);
        }
        let from = mover.position;
        let attack = mover.attack();
        let target = from + delta;
        let is_player = self.player_id == Some(id);

        if !self.world.has_tile(target) {
            return Ok(MoveOutcome::Blocked);
        }

        let occupants = self.entities.ids_at(target);

        let closed_door = occupants
            .iter()
            .copied()
            .find(|other| self.entities.get(*other).is_some_and(Entity::is_closed_door));
        if let Some(door_id) = closed_door {
            if !is_player {
                return Ok(MoveOutcome::Blocked);
            }
            if let Some(door) = self.entities.get_mut(door_id) {
                door.kind = EntityKind::Door(DoorState { closed: false });
                // The reveal waits for the move to finish, the door sprite does not.
                door.visible = false;
            }
            self.pending_door_reveal = Some(target);
            self.statistics.doors_opened += 1;
            self.relocate(id, from, target)?;
            return Ok(MoveOutcome::OpenedDoor(target));
        }

        let victim = occupants.iter().copied().find(|other| {
            *other != id && self.entities.get(*other).is_some_and(Entity::is_damageable)
        });
        if let Some(victim) = victim {
            let killed = self.resolve_attack(id, victim, attack)?;
            self.pathfinding.patch(&self.world, &self.entities, target);
            if let Some(mover) = self.entities.get_mut(id) {
                mover.visual.bump(delta);
            }
            return Ok(MoveOutcome::Attacked {
                target: victim,
                killed,
            });
        }

        self.relocate(id, from, target)?;
        Ok(MoveOutcome::Moved(target))
    }

    fn relocate(&mut self, id: EntityId, from: Position, to: Position) -> DelveResult<()> {
        self.entities.move_to(id, to)?;
        if let Some(entity) = self.entities.get_mut(id) {
            entity.visual.animate_to_grid(to);
        }
        self.pathfinding.patch(&self.world, &self.entities, from);
        self.pathfinding.patch(&self.world, &self.entities, to);
        Ok(())
    }

    /// Applies one attack. Returns whether the victim died.
    fn resolve_attack(
        &mut self,
        attacker: EntityId,
        victim: EntityId,
        amount: i32,
    ) -> DelveResult<bool> {
        let result = self
            .entities
            .get_mut(victim)
            .ok_or(DelveError::UnknownEntity(victim))?
            .take_damage(amount);

        if self.player_id == Some(victim) && result != DamageResult::Immune {
            self.statistics.damage_taken += amount.max(0) as u64;
            self.camera_shake.kick(DAMAGE_SHAKE);
        }

        match result {
            DamageResult::Killed => {
                self.kill(victim, attacker)?;
                Ok(true)
            }
            DamageResult::Survived(_) | DamageResult::Immune => Ok(false),
        }
    }

    /// Finishes off an entity: drops its loot as visible pickups and removes it.
    ///
    /// The player is never removed; it stays in the registry marked dead.
    pub fn kill(&mut self, id: EntityId, killer: EntityId) -> DelveResult<()> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(DelveError::UnknownEntity(id))?;
        let drops = entity.die(&self.loot, &mut self.rng);
        let position = entity.position;
        let was_creature = matches!(entity.kind, EntityKind::Creature(_));

        if self.player_id == Some(id) {
            info!("player died at ({}, {})", position.x, position.y);
            self.move_queue.clear();
        } else {
            self.entities.remove(id);
            if self.player_id == Some(killer) {
                if was_creature {
                    self.statistics.enemies_defeated += 1;
                } else {
                    self.statistics.objects_busted += 1;
                }
            }
        }

        for stack in drops {
            self.entities.spawn_pickup(stack, position, true);
        }
        self.pathfinding.patch(&self.world, &self.entities, position);
        Ok(())
    }

    /// Runs one action for every visible, living creature other than the player.
    pub fn time_advance(&mut self) {
        for id in self.entities.creature_ids() {
            if self.player_id == Some(id) || !self.entities.contains(id) {
                continue;
            }
            if let Err(e) = self.do_a_thing(id) {
                warn!("creature {} could not act: {}", id, e);
            }
        }
    }

    /// Buffers a player move. Returns false if it was dropped.
    pub fn queue_move(&mut self, delta: Position) -> bool {
        if !self.player_alive() {
            return false;
        }
        self.move_queue.push(delta)
    }

    /// Requests one step of world time without moving. Returns false if the
    /// player is dead.
    pub fn wait_turn(&mut self) -> bool {
        if !self.player_alive() {
            return false;
        }
        self.wait_requested = true;
        true
    }

    pub fn toggle_reveal_generated(&mut self) -> bool {
        self.debug.reveal_generated = !self.debug.reveal_generated;
        info!("reveal generated tiles: {}", self.debug.reveal_generated);
        self.debug.reveal_generated
    }

    pub fn toggle_show_fps(&mut self) -> bool {
        self.debug.show_fps = !self.debug.show_fps;
        self.debug.show_fps
    }

    /// Advances the simulation by one frame.
    pub fn tick(&mut self, delta_ms: u32, commands: &[Command]) -> TickOutcome {
        for command in commands {
            match command {
                Command::Exit => {
                    info!("exit requested");
                    return TickOutcome::Quit;
                }
                Command::Reset => {
                    info!("restart requested");
                    return TickOutcome::Restart;
                }
                Command::ToggleRevealGenerated => {
                    self.toggle_reveal_generated();
                }
                Command::ToggleFps => {
                    self.toggle_show_fps();
                }
                Command::Wait => {
                    self.wait_turn();
                }
                Command::MoveUp | Command::MoveDown | Command::MoveLeft | Command::MoveRight => {
                    if let Some(delta) = command.move_delta() {
                        self.queue_move(delta);
                    }
                }
                Command::Confirm | Command::ToggleMenu => {}
            }
        }

        if self.clock.is_animating() {
            self.step_animation(delta_ms);
        } else {
            self.step_logic();
        }

        self.camera_shake.decay(delta_ms);
        TickOutcome::Continue
    }

    /// Resolves one discrete step if there is input for it, then starts the clock.
    fn step_logic(&mut self) {
        let Some(player_id) = self.player_id else {
            return;
        };
        if !self.player_alive() {
            self.wait_requested = false;
            return;
        }

        if self.wait_requested {
            self.wait_requested = false;
            self.statistics.waits += 1;
        } else if let Some(delta) = self.move_queue.pop() {
            match self.attempt_move(player_id, delta) {
                Ok(outcome) => {
                    self.statistics.turns_taken += 1;
                    debug!("player move ({}, {}): {:?}", delta.x, delta.y, outcome);
                }
                Err(e) => warn!("player move failed: {}", e),
            }
        } else {
            return;
        }

        self.time_advance();
        self.clock.start();
    }

    fn step_animation(&mut self, delta_ms: u32) {
        match self.clock.advance(delta_ms) {
            ClockStep::Progress(progress) => {
                for entity in self.entities.values_mut() {
                    if entity.is_active() {
                        entity.visual.update(progress);
                    }
                }
            }
            ClockStep::Completed => {
                for entity in self.entities.values_mut() {
                    entity.visual.finish();
                }
                self.post_move_hooks();
            }
            ClockStep::Idle => {}
        }
    }

    /// Door reveal, pickup collection and pathfinding resync.
    fn post_move_hooks(&mut self) {
        self.hooks_run += 1;

        if let Some(door) = self.pending_door_reveal.take() {
            let report = self.reveal(door);
            debug!(
                "door at ({}, {}) revealed {} tiles",
                door.x, door.y, report.tiles_revealed
            );
        }

        let Some(player) = self.player_position() else {
            return;
        };
        if self.player_alive() {
            self.collect_pickups(player);
        }
        if self.pathfinding.needs_resync(player) {
            self.pathfinding
                .rebuild(&self.world, &self.entities, player);
        }
    }

    fn collect_pickups(&mut self, position: Position) {
        for id in self.entities.ids_at(position) {
            let is_pickup = self
                .entities
                .get(id)
                .is_some_and(|entity| matches!(entity.kind, EntityKind::Pickup(_)));
            if !is_pickup {
                continue;
            }
            if let Some(Entity {
                kind: EntityKind::Pickup(pickup),
                ..
            }) = self.entities.remove(id)
            {
                debug!("picked up {} x{}", pickup.stack.item, pickup.stack.quantity);
                self.inventory.add(pickup.stack, &self.catalog);
                self.statistics.items_collected += 1;
            }
        }
    }
}
