//! Melee enemy nodes and blackboard.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use behavior_tree::{
    Action, BehaviorTree, BehaviorTreeBuilder, Blackboard, BuildError, Clock, Condition, Cooldown,
    FloatAtMost, NodeRegistry, NodeStatus, Params, PriorityType, TickContext,
};

pub const DISTANCE: &str = "DistanceToPlayer";
pub const STAMINA: &str = "Stamina";
pub const ATTACK_POWER: &str = "AttackPower";
pub const IS_ATTACKING: &str = "IsAttacking";

pub const MELEE_BLACKBOARD: &str = "MeleeEnemyBlackboard";
pub const RANGED_BLACKBOARD: &str = "RangedEnemyBlackboard";

const ATTACK_RANGE: f32 = 1.5;
const ATTACK_COST: f32 = 20.0;

pub fn melee_blackboard() -> Blackboard {
    Blackboard::new(MELEE_BLACKBOARD)
        .with_bool(IS_ATTACKING, false)
        .with_float(DISTANCE, 200.0)
        .with_float("Health", 100.0)
        .with_float(STAMINA, 50.0)
        .with_int(ATTACK_POWER, 10)
        .with_string("CurrentState", "Idle")
}

pub fn ranged_blackboard() -> Blackboard {
    Blackboard::new(RANGED_BLACKBOARD)
        .with_bool("IsPlayerInSight", false)
        .with_bool("ShouldReload", false)
        .with_bool("CanShoot", true)
        .with_float(DISTANCE, 300.0)
        .with_float("Health", 100.0)
        .with_int("AmmoCount", 5)
        .with_int("DamageAmount", 15)
        .with_string("CurrentState", "Idle")
}

/// Domain object that owns a tree.
#[derive(Debug)]
pub struct Enemy {
    pub name: String,
}

/// Frame counter shared by every cooldown in the demo.
#[derive(Clone, Debug)]
pub struct FrameClock {
    frame: Arc<AtomicU64>,
    frame_secs: f64,
}

impl FrameClock {
    pub fn new(frame_secs: f64) -> Self {
        Self {
            frame: Arc::new(AtomicU64::new(0)),
            frame_secs,
        }
    }

    pub fn advance(&self) -> u64 {
        self.frame.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Clock for FrameClock {
    fn seconds(&self) -> f64 {
        self.frame.load(Ordering::Relaxed) as f64 * self.frame_secs
    }
}

/// Walks towards the player until within `stop_distance`.
pub struct MoveTo {
    stop_distance: f32,
    step: f32,
}

impl MoveTo {
    pub fn new(stop_distance: f32, step: f32) -> Self {
        Self {
            stop_distance,
            step,
        }
    }

    pub fn from_params(params: &Params) -> Self {
        Self::new(
            params.float_or("StopDistance", 1.0),
            params.float_or("MoveSpeed", 1.0),
        )
    }
}

impl Action for MoveTo {
    fn on_start(&mut self, ctx: &mut TickContext<'_>) {
        if let Some(enemy) = ctx.owner::<Enemy>() {
            tracing::info!(
                "{} closes in from {:.1}",
                enemy.name,
                ctx.blackboard().float_value(DISTANCE)
            );
        }
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) -> NodeStatus {
        let distance = ctx.blackboard().float_value(DISTANCE);
        if distance <= self.stop_distance {
            return NodeStatus::Success;
        }
        let next = (distance - self.step).max(self.stop_distance);
        if let Err(e) = ctx.blackboard_mut().set_float(DISTANCE, next) {
            tracing::warn!("MoveTo: {}", e);
            return NodeStatus::Failure;
        }
        NodeStatus::Running
    }

    fn on_abort(&mut self, ctx: &mut TickContext<'_>) {
        tracing::debug!("MoveTo aborted in {}", ctx.tree_name());
    }

    fn params(&self) -> Params {
        Params::new()
            .with_float("StopDistance", self.stop_distance)
            .with_float("MoveSpeed", self.step)
    }
}

/// Winds up for `duration` ticks, then deals the blackboard's attack power.
pub struct MeleeAttack {
    power_key: String,
    duration: u32,
    elapsed: u32,
}

impl MeleeAttack {
    pub fn new(power_key: impl Into<String>, duration: u32) -> Self {
        Self {
            power_key: power_key.into(),
            duration,
            elapsed: 0,
        }
    }

    pub fn from_params(params: &Params) -> Self {
        let duration = u32::try_from(params.int_or("AttackDuration", 2)).unwrap_or(1);
        Self::new(params.string_or("AttackPowerKey", ATTACK_POWER), duration)
    }

    fn set_attacking(ctx: &mut TickContext<'_>, attacking: bool) {
        if let Err(e) = ctx.blackboard_mut().set_bool(IS_ATTACKING, attacking) {
            tracing::warn!("MeleeAttack: {}", e);
        }
    }
}

impl Action for MeleeAttack {
    fn on_start(&mut self, ctx: &mut TickContext<'_>) {
        self.elapsed = 0;
        Self::set_attacking(ctx, true);
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) -> NodeStatus {
        self.elapsed += 1;
        if self.elapsed < self.duration {
            return NodeStatus::Running;
        }

        let power = ctx.blackboard().int_value(&self.power_key);
        let stamina = ctx.blackboard().float_value(STAMINA);
        let attacker = ctx
            .owner::<Enemy>()
            .map(|enemy| enemy.name.clone())
            .unwrap_or_else(|| ctx.tree_name().to_owned());
        tracing::info!("{} dealt {} damage to the player", attacker, power);

        if let Err(e) = ctx
            .blackboard_mut()
            .set_float(STAMINA, (stamina - ATTACK_COST).max(0.0))
        {
            tracing::warn!("MeleeAttack: {}", e);
        }
        NodeStatus::Success
    }

    fn on_finished(&mut self, ctx: &mut TickContext<'_>) {
        Self::set_attacking(ctx, false);
    }

    fn on_abort(&mut self, ctx: &mut TickContext<'_>) {
        Self::set_attacking(ctx, false);
    }

    fn params(&self) -> Params {
        Params::new()
            .with_string("AttackPowerKey", self.power_key.clone())
            .with_int("AttackDuration", i32::try_from(self.duration).unwrap_or(i32::MAX))
    }
}

/// Slow attack that pays its stamina cost once the swing lands.
pub struct HeavyAttack {
    power_key: String,
    stamina_key: String,
    duration: u32,
    stamina_cost: f32,
    elapsed: u32,
}

impl HeavyAttack {
    pub fn new(
        power_key: impl Into<String>,
        stamina_key: impl Into<String>,
        duration: u32,
        stamina_cost: f32,
    ) -> Self {
        Self {
            power_key: power_key.into(),
            stamina_key: stamina_key.into(),
            duration,
            stamina_cost,
            elapsed: 0,
        }
    }

    pub fn from_params(params: &Params) -> Self {
        let duration = u32::try_from(params.int_or("AttackDuration", 3)).unwrap_or(1);
        Self::new(
            params.string_or("AttackPowerKey", ATTACK_POWER),
            params.string_or("StaminaKey", STAMINA),
            duration,
            params.float_or("StaminaCost", 30.0),
        )
    }
}

impl Action for HeavyAttack {
    fn on_start(&mut self, ctx: &mut TickContext<'_>) {
        self.elapsed = 0;
        MeleeAttack::set_attacking(ctx, true);
        tracing::debug!(
            "heavy attack wind-up, stamina {:.1}",
            ctx.blackboard().float_value(&self.stamina_key)
        );
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) -> NodeStatus {
        self.elapsed += 1;
        if self.elapsed < self.duration {
            return NodeStatus::Running;
        }
        tracing::info!(
            "{} heavy attack dealt {} damage to the player",
            ctx.tree_name(),
            ctx.blackboard().int_value(&self.power_key)
        );
        NodeStatus::Success
    }

    fn on_finished(&mut self, ctx: &mut TickContext<'_>) {
        MeleeAttack::set_attacking(ctx, false);
        let stamina = ctx.blackboard().float_value(&self.stamina_key) - self.stamina_cost;
        if let Err(e) = ctx
            .blackboard_mut()
            .set_float(&self.stamina_key, stamina.max(0.0))
        {
            tracing::warn!("HeavyAttack: {}", e);
        }
    }

    fn on_abort(&mut self, ctx: &mut TickContext<'_>) {
        MeleeAttack::set_attacking(ctx, false);
    }

    fn params(&self) -> Params {
        Params::new()
            .with_string("AttackPowerKey", self.power_key.clone())
            .with_string("StaminaKey", self.stamina_key.clone())
            .with_int("AttackDuration", i32::try_from(self.duration).unwrap_or(i32::MAX))
            .with_float("StaminaCost", self.stamina_cost)
    }
}

/// Succeeds while stamina covers an attack.
pub struct CanAttack {
    stamina_key: String,
    required: f32,
}

impl CanAttack {
    pub fn new(stamina_key: impl Into<String>, required: f32) -> Self {
        Self {
            stamina_key: stamina_key.into(),
            required,
        }
    }

    pub fn from_params(params: &Params) -> Self {
        Self::new(
            params.string_or("StaminaKey", STAMINA),
            params.float_or("RequiredStamina", ATTACK_COST),
        )
    }
}

impl Condition for CanAttack {
    fn check(&mut self, ctx: &mut TickContext<'_>) -> bool {
        ctx.blackboard().float_value(&self.stamina_key) >= self.required
    }

    fn params(&self) -> Params {
        Params::new()
            .with_string("StaminaKey", self.stamina_key.clone())
            .with_float("RequiredStamina", self.required)
    }
}

/// Registers the melee kinds. `Cooldown` is replaced by a variant reading
/// the demo's frame clock.
pub fn register(registry: &mut NodeRegistry, clock: &FrameClock) {
    registry.register_action("MoveTo", MoveTo::from_params);
    registry.register_action("MeleeAttack", MeleeAttack::from_params);
    registry.register_action("HeavyAttack", HeavyAttack::from_params);
    registry.register_condition("CanAttack", CanAttack::from_params);
    registry.register_blackboard(MELEE_BLACKBOARD, melee_blackboard);
    registry.register_blackboard(RANGED_BLACKBOARD, ranged_blackboard);

    let clock = clock.clone();
    registry.register_decorator("Cooldown", move |params: &Params| {
        let secs = f64::from(params.float_or("CooldownTime", 5.0));
        Cooldown::with_clock(secs, clock.clone())
    });
}

/// ```text
/// Root
/// └── Selector "Main"
///     ├── Sequence "Attack"   [IsPlayerInRange: LowerPriority, CanAttack]
///     │   └── Cooldown
///     │       └── MeleeAttack
///     └── MoveTo
/// ```
pub fn melee_tree(
    name: &str,
    approach_step: f32,
    clock: &FrameClock,
) -> Result<BehaviorTree, BuildError> {
    BehaviorTreeBuilder::new(name)
        .blackboard(melee_blackboard())
        .root()?
        .selector("Main")?
        .sequence("Attack")?
        .condition(
            PriorityType::LowerPriority,
            "IsPlayerInRange",
            FloatAtMost::new(DISTANCE, ATTACK_RANGE),
        )?
        .condition(PriorityType::None, "CanAttack", CanAttack::new(STAMINA, ATTACK_COST))?
        .decorator("Cooldown", Cooldown::with_clock(0.5, clock.clone()))?
        .action("MeleeAttack", MeleeAttack::new(ATTACK_POWER, 2))?
        .end()?
        .action("MoveTo", MoveTo::new(1.0, approach_step))?
        .end()?
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heavy_attack_pays_stamina_when_it_lands() {
        let mut registry = NodeRegistry::with_builtins();
        register(&mut registry, &FrameClock::new(0.25));
        let params = Params::new()
            .with_int("AttackDuration", 2)
            .with_float("StaminaCost", 30.0);
        let heavy = registry.create_action("HeavyAttack", &params).unwrap();

        let mut tree = BehaviorTreeBuilder::new("Brute")
            .blackboard(melee_blackboard())
            .root()
            .unwrap()
            .action("HeavyAttack", heavy)
            .unwrap()
            .build()
            .unwrap();
        tree.start_tree();

        assert_eq!(tree.tick_tree(), Some(NodeStatus::Running));
        assert!(tree.blackboard().bool_value(IS_ATTACKING));
        assert_eq!(tree.blackboard().float_value(STAMINA), 50.0);

        assert_eq!(tree.tick_tree(), Some(NodeStatus::Success));
        assert!(!tree.blackboard().bool_value(IS_ATTACKING));
        assert_eq!(tree.blackboard().float_value(STAMINA), 20.0);
    }

    #[test]
    fn ranged_blackboard_is_registered() {
        let mut registry = NodeRegistry::new();
        register(&mut registry, &FrameClock::new(0.25));

        let blackboard = registry.create_blackboard(RANGED_BLACKBOARD).unwrap();
        assert_eq!(blackboard.int_value("AmmoCount"), 5);
        assert_eq!(blackboard.float_value(DISTANCE), 300.0);
        assert!(blackboard.bool_value("CanShoot"));
    }
}
