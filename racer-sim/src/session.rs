use glam::DVec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use slotmap::{new_key_type, SlotMap};
use tracing::{debug, info, warn};

use racer_core::control::ControlIntent;
use racer_core::entity_location::EntityLocation;
use racer_core::hook::EventHooks;
use racer_core::lap_info::{CheckpointOrder, LapInformation, RacePhase};
use racer_core::race_event::RaceEvent;
use racer_core::settings::Settings;
use racer_core::AgentID;

use crate::ai::ability::PushAbility;
use crate::ai::stuck::StuckStatus;
use crate::ai::waypoint::fallback_waypoint;
use crate::ai::{CarState, NpcDriver, NpcState, SensorDebugRay};
use crate::checkpoints::CheckpointRegistry;
use crate::map::{TrackMap, DEFAULT_START_HEADING_DEGREES};
use crate::physics::{BodyPurpose, ContactPhase, World};
use crate::race::{CameraPose, CameraRig, RaceState};
use crate::vehicle::{fallback_start, Vehicle};

pub const PLAYER_START: &str = "Player";
pub const NPC_START_PREFIX: &str = "NPC";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerCommand {
    Drive(ControlIntent),
    // let the NPC logic drive, aiming at the race's next expected checkpoint
    Autopilot,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub events: Vec<RaceEvent>,
    pub stop: bool,
}

new_key_type! {
    /// Identifies a spawned NPC for as long as it stays in the session.
    pub struct AgentHandle;
}

pub struct Agent {
    pub id: AgentID,
    pub name: String,
    pub vehicle: Vehicle,
    // created on the first tick the agent is driven
    pub npc: Option<NpcState>,
    pub ability: PushAbility,
}

#[derive(Clone, Debug, Serialize)]
pub struct RaceSummary {
    pub track: String,
    pub ticks: u64,
    pub elapsed_secs: f64,
    pub phase: RacePhase,
    pub lap: LapInformation,
    pub player_position: Option<DVec2>,
    pub npcs: usize,
}

/// One race on one track: the physics world, the player's car, the NPCs and
/// the lap bookkeeping, all advanced together by `tick`.
pub struct RaceSession {
    settings: Settings,
    map: TrackMap,
    world: World,
    registry: CheckpointRegistry,
    race: RaceState,
    player: Vehicle,
    autopilot: Option<NpcState>,
    agents: SlotMap<AgentHandle, Agent>,
    next_agent_id: AgentID,
    driver: NpcDriver,
    rng: StdRng,
    hooks: EventHooks,
    ticks: u64,
    elapsed: f64,
}

impl RaceSession {
    pub fn new(map: TrackMap, settings: Settings, seed: u64) -> Self {
        let mut world = World::new();
        map.spawn_walls(&mut world);
        let registry = CheckpointRegistry::build(&map, &mut world);

        let player_start = map.start_location(PLAYER_START).unwrap_or_else(|| {
            warn!(
                "track '{}' has no '{}' start marker, starting at the map center",
                map.name, PLAYER_START
            );
            EntityLocation::new(map.center(), DEFAULT_START_HEADING_DEGREES.to_radians())
        });
        let player = Vehicle::player(&mut world, &player_start, &settings.vehicle);

        let rig = CameraRig {
            overview: CameraPose::overview(map.center(), settings.race.overview_zoom),
            player: CameraPose::following(&player_start, settings.race.player_zoom),
        };
        let race = RaceState::new(&settings.race, &registry, rig);
        let driver = NpcDriver::new(settings.ai.clone());
        let npc_names: Vec<String> = map
            .start_names()
            .into_iter()
            .filter(|name| name.starts_with(NPC_START_PREFIX))
            .collect();

        let mut session = RaceSession {
            settings,
            map,
            world,
            registry,
            race,
            player,
            autopilot: None,
            agents: SlotMap::with_key(),
            next_agent_id: 1,
            driver,
            rng: StdRng::seed_from_u64(seed),
            hooks: EventHooks::new(),
            ticks: 0,
            elapsed: 0.0,
        };
        for name in &npc_names {
            session.spawn_npc(name);
        }
        info!(
            "session on '{}' ready: {} laps, {} NPCs",
            session.map.name,
            session.race.total_laps(),
            session.agents.len()
        );
        session
    }

    /// Adds an NPC at the start marker called `name`, or at a fallback spot
    /// when the map has no such marker.
    pub fn spawn_npc(&mut self, name: &str) -> AgentHandle {
        let id = self.next_agent_id;
        self.next_agent_id += 1;
        let start = self.map.start_location(name).unwrap_or_else(|| {
            debug!("no start marker for {}, using a fallback spot", name);
            fallback_start(self.agents.len())
        });
        let vehicle = Vehicle::npc(&mut self.world, &start, id, &self.settings.vehicle);
        debug!(
            "spawned {} (agent {}) at ({:.0}, {:.0})",
            name, id, start.position.x, start.position.y
        );
        self.agents.insert(Agent {
            id,
            name: name.to_string(),
            vehicle,
            npc: None,
            ability: PushAbility::default(),
        })
    }

    pub fn remove_npc(&mut self, handle: AgentHandle) -> bool {
        match self.agents.remove(handle) {
            Some(mut agent) => {
                agent.ability.cancel(&mut self.world);
                self.world.remove(agent.vehicle.body);
                debug!("removed {} (agent {})", agent.name, agent.id);
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self, time_step: f64, command: PlayerCommand) -> TickReport {
        let time_step = if time_step.is_finite() {
            time_step.clamp(0.0, self.settings.race.max_tick_delta)
        } else {
            0.0
        };
        let mut events = Vec::new();

        // forces set by the previous tick's intents move the cars first, then
        // the drivers react to where the cars ended up
        self.step_world(time_step, &mut events);
        self.settle_vehicles();

        let agents_move = self.race.can_agents_move();
        let player_intent = match command {
            _ if !agents_move => ControlIntent::idle(),
            PlayerCommand::Drive(intent) => intent,
            PlayerCommand::Autopilot => self.autopilot_intent(time_step),
        };
        self.player.apply_intent(
            &mut self.world,
            player_intent,
            time_step,
            &self.settings.vehicle,
        );

        if agents_move {
            self.drive_npcs(time_step, &mut events);
        } else {
            for (_, agent) in self.agents.iter_mut() {
                agent.vehicle.apply_intent(
                    &mut self.world,
                    ControlIntent::idle(),
                    time_step,
                    &self.settings.vehicle,
                );
            }
        }

        events.extend(self.race.update(time_step));

        self.ticks += 1;
        self.elapsed += time_step;
        for event in &events {
            self.hooks.call(event);
        }
        TickReport {
            events,
            stop: self.race.should_stop(),
        }
    }

    fn autopilot_intent(&mut self, time_step: f64) -> ControlIntent {
        let Some(location) = self.player.location(&self.world) else {
            return ControlIntent::idle();
        };
        let car = CarState {
            location,
            velocity: self.player.velocity(&self.world),
            body: self.player.body,
        };
        let goal = self
            .registry
            .position(self.race.next_checkpoint_order())
            .unwrap_or_else(|| fallback_waypoint(self.driver.settings()));
        let driver = &self.driver;
        let state = self.autopilot.get_or_insert_with(|| driver.new_state());
        driver
            .drive_towards(state, &car, &self.world, goal, time_step, &mut self.rng)
            .intent
    }

    fn drive_npcs(&mut self, time_step: f64, events: &mut Vec<RaceEvent>) {
        let Self {
            world,
            agents,
            registry,
            driver,
            rng,
            settings,
            ..
        } = self;

        for (_, agent) in agents.iter_mut() {
            let Some(location) = agent.vehicle.location(world) else {
                continue;
            };
            let car = CarState {
                location,
                velocity: agent.vehicle.velocity(world),
                body: agent.vehicle.body,
            };
            let state = agent.npc.get_or_insert_with(|| driver.new_state());
            let outcome = driver.update(state, &car, &*world, registry, time_step, &mut *rng);
            if outcome.stuck_status == StuckStatus::Stuck {
                debug!("{} is stuck, backing out", agent.name);
                events.push(RaceEvent::StuckRecovery { agent: agent.id });
            }
            agent
                .vehicle
                .apply_intent(world, outcome.intent, time_step, &settings.vehicle);

            if let Some(event) = agent.ability.update(
                world,
                agent.id,
                agent.vehicle.body,
                time_step,
                &settings.ability,
            ) {
                events.push(event);
            }
        }
    }

    fn step_world(&mut self, time_step: f64, events: &mut Vec<RaceEvent>) {
        let Self {
            world,
            race,
            registry,
            ..
        } = self;

        world.step(time_step, &mut |contact| {
            if contact.phase != ContactPhase::Enter {
                return;
            }
            let Some((car, other)) =
                contact.involving(|info| info.purpose == BodyPurpose::PlayerVehicle)
            else {
                return;
            };
            if !matches!(other.purpose, BodyPurpose::Checkpoint(_)) {
                return;
            }
            match race.on_checkpoint_entered(registry, car.position) {
                Ok(outcome) => events.extend(outcome.events()),
                Err(rejection) => {
                    debug!("crossing rejected: {}", rejection);
                    events.push(rejection.to_event());
                }
            }
        });
    }

    // speed caps and the ground each car is now driving on
    fn settle_vehicles(&mut self) {
        let Self {
            world,
            map,
            player,
            agents,
            ..
        } = self;
        let vehicles =
            std::iter::once(player).chain(agents.iter_mut().map(|(_, agent)| &mut agent.vehicle));
        for vehicle in vehicles {
            vehicle.limit_speed(world);
            let Some(position) = world.position(vehicle.body) else {
                continue;
            };
            let terrain = map.terrain_at(position);
            if terrain != vehicle.terrain {
                debug!("{:?} now on {:?}", vehicle.body, terrain);
                vehicle.terrain = terrain;
            }
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn map(&self) -> &TrackMap {
        &self.map
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn registry(&self) -> &CheckpointRegistry {
        &self.registry
    }

    pub fn race(&self) -> &RaceState {
        &self.race
    }

    pub fn player(&self) -> &Vehicle {
        &self.player
    }

    pub fn player_location(&self) -> Option<EntityLocation> {
        self.player.location(&self.world)
    }

    pub fn agent(&self, handle: AgentHandle) -> Option<&Agent> {
        self.agents.get(handle)
    }

    pub fn agents(&self) -> impl Iterator<Item = (AgentHandle, &Agent)> {
        self.agents.iter()
    }

    pub fn hooks_mut(&mut self) -> &mut EventHooks {
        &mut self.hooks
    }

    /// The NPC's last sensor scan, drawn from where it is now. `None` until
    /// the agent has been driven at least once.
    pub fn sensor_debug_rays(&self, handle: AgentHandle) -> Option<Vec<SensorDebugRay>> {
        let agent = self.agents.get(handle)?;
        let position = self.world.position(agent.vehicle.body)?;
        Some(agent.npc.as_ref()?.debug_rays(position))
    }

    pub fn lap_information(&self) -> LapInformation {
        self.race.lap_information(&self.registry)
    }

    pub fn checkpoint_position(&self, order: CheckpointOrder) -> Option<DVec2> {
        self.registry.position(order)
    }

    pub fn crossed_count(&self) -> usize {
        self.registry.crossed_count()
    }

    pub fn is_lap_complete(&self) -> bool {
        self.race.is_lap_complete(&self.registry)
    }

    pub fn camera(&self) -> CameraPose {
        self.race.camera()
    }

    pub fn countdown_display(&self) -> Option<u32> {
        self.race.countdown_display()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn summary(&self) -> RaceSummary {
        RaceSummary {
            track: self.map.name.clone(),
            ticks: self.ticks,
            elapsed_secs: self.elapsed,
            phase: self.race.phase(),
            lap: self.lap_information(),
            player_position: self.world.position(self.player.body),
            npcs: self.agents.len(),
        }
    }
}
