//! Scripted chapters of the game
//!
//! A chapter is a flat list of [`Step`]s that the [`Autoplayer`] runs in
//! order. Paths are written exactly as they are walked on the map; every
//! chapter starts where the previous one ended.
//!
//! [`Autoplayer`]: crate::autoplayer::Autoplayer

use std::fmt;
use std::str::FromStr;

use crate::errors::AutoplayerError;
use crate::npc::Npc;
use crate::overworld::{MovementMode, Path};
use crate::party::{Ally, Skill};

/// One instruction of a chapter script
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Follow a path, fighting whatever shows up
    Walk(Path),
    /// Hunt back and forth for `steps` steps, optionally from a spot reached
    /// by `initial_path` (walked back afterwards)
    Grind {
        steps: u32,
        initial_path: Option<Path>,
    },
    SetMode(MovementMode),
    SpendSkill {
        ally: Ally,
        skill: Skill,
        times: u32,
    },
    Talk(Npc),
    Equip { item: u32, ally: Ally },
    /// Let the battle tactics use a spell from now on
    EnableSpell(Skill),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Walk(path) => write!(f, "walk {path}"),
            Step::Grind {
                steps,
                initial_path: Some(path),
            } => write!(f, "grind {steps} steps from {path}"),
            Step::Grind { steps, .. } => write!(f, "grind {steps} steps"),
            Step::SetMode(mode) => write!(f, "switch to {mode:?} movement"),
            Step::SpendSkill { ally, skill, times } => {
                write!(f, "spend {times} point(s) on {ally}'s {skill}")
            }
            Step::Talk(npc) => write!(f, "talk to {npc}"),
            Step::Equip { item, ally } => write!(f, "equip item {item} on {ally}"),
            Step::EnableSpell(skill) => write!(f, "enable {skill}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChapterId {
    HomeTraining,
    MinerForeman,
    Zombom,
    SandGrundo,
    Ramtor1,
    Ramtor2,
    Leximp,
    CavesOfTerror,
    Kolvars,
    Scuzzy,
    Siliclast,
    Gebarn,
    Revenant,
}

impl ChapterId {
    pub const ALL: [ChapterId; 13] = [
        ChapterId::HomeTraining,
        ChapterId::MinerForeman,
        ChapterId::Zombom,
        ChapterId::SandGrundo,
        ChapterId::Ramtor1,
        ChapterId::Ramtor2,
        ChapterId::Leximp,
        ChapterId::CavesOfTerror,
        ChapterId::Kolvars,
        ChapterId::Scuzzy,
        ChapterId::Siliclast,
        ChapterId::Gebarn,
        ChapterId::Revenant,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChapterId::HomeTraining => "home-training",
            ChapterId::MinerForeman => "miner-foreman",
            ChapterId::Zombom => "zombom",
            ChapterId::SandGrundo => "sand-grundo",
            ChapterId::Ramtor1 => "ramtor-1",
            ChapterId::Ramtor2 => "ramtor-2",
            ChapterId::Leximp => "leximp",
            ChapterId::CavesOfTerror => "caves-of-terror",
            ChapterId::Kolvars => "kolvars",
            ChapterId::Scuzzy => "scuzzy",
            ChapterId::Siliclast => "siliclast",
            ChapterId::Gebarn => "gebarn",
            ChapterId::Revenant => "revenant",
        }
    }

    pub fn act(self) -> u8 {
        match self {
            ChapterId::HomeTraining
            | ChapterId::MinerForeman
            | ChapterId::Zombom
            | ChapterId::SandGrundo
            | ChapterId::Ramtor1
            | ChapterId::Ramtor2 => 1,
            ChapterId::Leximp | ChapterId::CavesOfTerror | ChapterId::Kolvars | ChapterId::Scuzzy => 2,
            ChapterId::Siliclast | ChapterId::Gebarn | ChapterId::Revenant => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChapterId::HomeTraining => "Train outside Trestin and rest with Mother",
            ChapterId::MinerForeman => "Defeat the Miner Foreman and walk to White River City",
            ChapterId::Zombom => "Grind, defeat Zombom and walk back to Mipsy",
            ChapterId::SandGrundo => "Recruit Mipsy and defeat the Mutant Sand Grundo",
            ChapterId::Ramtor1 => "Shop in Trestin and head towards Ramtor",
            ChapterId::Ramtor2 => "Rest with Guard Thyet and defeat Ramtor",
            ChapterId::Leximp => "Defeat Leximp and walk to the cave",
            ChapterId::CavesOfTerror => "Clear the Caves of Terror and recruit Talinia",
            ChapterId::Kolvars => "Defeat Kolvars and grind",
            ChapterId::Scuzzy => "Rest with Allden and defeat Scuzzy",
            ChapterId::Siliclast => "Defeat Siliclast",
            ChapterId::Gebarn => "Defeat Gebarn II",
            ChapterId::Revenant => "Recruit Velm and defeat the Revenant",
        }
    }

    /// Build the chapter's step list.
    pub fn chapter(self) -> Result<Chapter, AutoplayerError> {
        let steps = match self {
            ChapterId::HomeTraining => home_training(),
            ChapterId::MinerForeman => miner_foreman(),
            ChapterId::Zombom => zombom(),
            ChapterId::SandGrundo => sand_grundo(),
            ChapterId::Ramtor1 => ramtor_1(),
            ChapterId::Ramtor2 => ramtor_2(),
            ChapterId::Leximp => leximp(),
            ChapterId::CavesOfTerror => caves_of_terror(),
            ChapterId::Kolvars => kolvars(),
            ChapterId::Scuzzy => scuzzy(),
            ChapterId::Siliclast => siliclast(),
            ChapterId::Gebarn => gebarn(),
            ChapterId::Revenant => revenant(),
        }
        .finish()?;

        Ok(Chapter {
            id: self,
            title: self.title(),
            steps,
        })
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChapterId {
    type Err = AutoplayerError;

    /// Accepts the chapter name or its 1-based position in the catalogue.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        if let Ok(n) = wanted.parse::<usize>() {
            if let Some(id) = n.checked_sub(1).and_then(|i| ChapterId::ALL.get(i)) {
                return Ok(*id);
            }
        }
        ChapterId::ALL
            .into_iter()
            .find(|id| id.name() == wanted)
            .ok_or_else(|| AutoplayerError::InvalidArgument(format!("Unknown chapter: {s}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: ChapterId,
    pub title: &'static str,
    pub steps: Vec<Step>,
}

impl Chapter {
    /// Overworld steps the chapter walks or grinds, not counting recovery.
    pub fn planned_steps(&self) -> usize {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Walk(path) => path.len(),
                Step::Grind {
                    steps,
                    initial_path,
                } => *steps as usize + 2 * initial_path.as_ref().map_or(0, Path::len),
                _ => 0,
            })
            .sum()
    }
}

/// Every chapter in play order.
pub fn chapters() -> Result<Vec<Chapter>, AutoplayerError> {
    ChapterId::ALL.into_iter().map(ChapterId::chapter).collect()
}

/// Chained step builder. The first bad path is reported by `finish`.
#[derive(Default)]
struct Script {
    steps: Vec<Step>,
    error: Option<AutoplayerError>,
}

impl Script {
    fn new() -> Self {
        Self::default()
    }

    fn parse(&mut self, path: &str) -> Option<Path> {
        match Path::parse(path) {
            Ok(path) => Some(path),
            Err(e) => {
                self.error.get_or_insert(e);
                None
            }
        }
    }

    fn walk(mut self, path: &str) -> Self {
        if let Some(path) = self.parse(path) {
            self.steps.push(Step::Walk(path));
        }
        self
    }

    fn grind(mut self, steps: u32) -> Self {
        self.steps.push(Step::Grind {
            steps,
            initial_path: None,
        });
        self
    }

    fn grind_from(mut self, steps: u32, initial_path: &str) -> Self {
        if let Some(path) = self.parse(initial_path) {
            self.steps.push(Step::Grind {
                steps,
                initial_path: Some(path),
            });
        }
        self
    }

    fn mode(mut self, mode: MovementMode) -> Self {
        self.steps.push(Step::SetMode(mode));
        self
    }

    fn spend(mut self, ally: Ally, skill: Skill, times: u32) -> Self {
        self.steps.push(Step::SpendSkill { ally, skill, times });
        self
    }

    fn talk(mut self, npc: Npc) -> Self {
        self.steps.push(Step::Talk(npc));
        self
    }

    fn enable(mut self, skill: Skill) -> Self {
        self.steps.push(Step::EnableSpell(skill));
        self
    }

    fn finish(self) -> Result<Vec<Step>, AutoplayerError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.steps),
        }
    }
}

const HOME_TRAINING_STEPS: u32 = 180;
/// Until this many steps the party is too weak to stay out and walks home
/// to rest after every step.
const HOME_TRAINING_WEAK_STEPS: u32 = 30;
const HOME_TRAINING_SKILL_INTERVAL: u32 = 15;
const WALK_TO_MOTHER: &str = "2666222866333";
const WALK_FROM_MOTHER: &str = "3333";

fn home_training() -> Script {
    let mut script = Script::new()
        .walk(WALK_FROM_MOTHER)
        .mode(MovementMode::Hunting);

    let mut steps = 0;
    while steps < HOME_TRAINING_STEPS {
        if steps < HOME_TRAINING_WEAK_STEPS {
            script = script.walk("7");
            steps += 1;
        } else {
            // Out and back so every batch ends on the starting tile
            script = script.walk("12");
            steps += 2;
        }

        if steps % HOME_TRAINING_SKILL_INTERVAL == 0 {
            script = script.spend(Ally::Rohane, Skill::MeleeHaste, 1);
        }
        if steps <= HOME_TRAINING_WEAK_STEPS {
            script = script
                .walk(WALK_TO_MOTHER)
                .talk(Npc::Mother)
                .walk(WALK_FROM_MOTHER);
        }
    }

    script.mode(MovementMode::Normal)
}

fn miner_foreman() -> Script {
    Script::new()
        .walk("33333357111111117111111882")
        .grind(100)
        .spend(Ally::Rohane, Skill::MeleeHaste, 2)
        .walk("882282288884444447444477777777771777448488226663666266222222226662222266333333333336333336666662")
        // One tile above the Miner Foreman
        .walk("2222")
        .walk("84444444444444448444488888888444484444448")
}

fn zombom() -> Script {
    // Potions barely drop in the Underground Cave, so level up before it
    Script::new()
        .grind_from(300, "7777")
        .spend(Ally::Rohane, Skill::MeleeHaste, 1)
        .walk(concat!(
            "77777777777488844882222222622288888444447777774444488888888844888288848228444",
            "77777771111517744362222222222222284453555511111222"
        ))
        .walk("222")
        .walk("515155553555535533333666666333335555511117111555113555366666666666222222222222222222222226663")
}

fn spend_rohane_crit_mipsy_defense(script: Script, times: u32) -> Script {
    script
        .spend(Ally::Rohane, Skill::Crit, times)
        .spend(Ally::Mipsy, Skill::MeleeDefense, times)
}

fn sand_grundo() -> Script {
    let script = Script::new()
        .talk(Npc::Mipsy)
        // Mipsy stays fragile; her points go into Direct Damage only
        .spend(Ally::Mipsy, Skill::DirectDamage, 11)
        .enable(Skill::DirectDamage)
        .walk("48882")
        .grind_from(150, "88");
    let script = spend_rohane_crit_mipsy_defense(script, 2)
        .walk("44444444744444448222222666666633333333366666666666666666666666663333517774")
        .walk("33335555551155")
        .walk("41111111111111444444111111111111114444444111335333335633333333333322222")
        .talk(Npc::Potraddo)
        .walk("11177444444444478444448482633336622222222662666222222882222222888822222224444477777")
        .grind(80);
    let script = spend_rohane_crit_mipsy_defense(script, 2)
        .walk("77777744488822266666666666638888")
        .talk(Npc::WitheredGhost)
        .walk("888888888")
        .grind(180);
    spend_rohane_crit_mipsy_defense(script, 2)
        .walk("8888882844444444888882222228882222222284444444484")
        .walk("444")
}

fn ramtor_1() -> Script {
    let script = Script::new().grind_from(200, "222");
    let script = spend_rohane_crit_mipsy_defense(script, 2)
        .walk("22222222222287744447771177828448222222263333663333351151111562651111111174444477771717111111117777777447444448888888884888444444444777")
        // One tile below Uthare
        .walk("1")
        .talk(Npc::Uthare)
        .walk("2888844822")
        .talk(Npc::Patannis)
        .walk("115533333333333")
        .grind_from(200, "666");
    spend_rohane_crit_mipsy_defense(script, 1)
        .walk("66666666666666666666666666222663633333335555555335511")
}

fn ramtor_2() -> Script {
    let script = Script::new()
        .walk("22888888844444444")
        .talk(Npc::GuardThyet)
        .walk("844")
        .walk("63333333333333366633333333333335555555555535335")
        .grind(100)
        .walk("1111115533")
        .grind(160);
    spend_rohane_crit_mipsy_defense(script, 2)
        .walk("356228866334744477711177744477715515333666222366333551111115848888884444447446662666663332223")
        .walk("33")
}

fn leximp() -> Script {
    Script::new()
        .walk("44")
        .walk("7844447747444444884882888822888815555555551155533336363363333356")
        .grind_from(200, "7844444")
        .walk("78444477474444441774474444444444447744444477444444444444444444444444444444477777777777771")
}

fn caves_of_terror() -> Script {
    Script::new()
        .walk("1")
        .grind_from(300, "115")
        .spend(Ally::Rohane, Skill::DamageIncrease, 4)
        .spend(Ally::Mipsy, Skill::CastingHaste, 4)
        .walk("1555533336663633633333555353533355777774444447444447774775553336335553353577711555177444447444448447471111111117771178")
        .walk("8")
        .talk(Npc::Talinia)
        .spend(Ally::Talinia, Skill::RangedAttacks, 11)
        .spend(Ally::Talinia, Skill::Shockwave, 11)
        .spend(Ally::Talinia, Skill::MeleeHaste, 4)
}

fn spend_act2_points(script: Script, times: u32) -> Script {
    script
        .spend(Ally::Rohane, Skill::DamageIncrease, times)
        .spend(Ally::Mipsy, Skill::CastingHaste, times)
        .spend(Ally::Talinia, Skill::MeleeHaste, times)
}

fn kolvars() -> Script {
    let script = Script::new()
        .walk("553")
        .walk("55551155555555555555335333355333333555636333333355155366633336633363511777155366366626")
        .grind(200);
    spend_act2_points(script, 2)
        .walk("6")
        .walk("666666666222268")
}

fn scuzzy() -> Script {
    let script = Script::new()
        .walk("222822222888888888888444444444444444447444844444444888447774777747777711114")
        .walk("57774")
        .talk(Npc::Allden)
        .walk("33555111555")
        .grind_from(250, "555");
    spend_act2_points(script, 3)
        .walk("7")
        .walk(concat!(
            "353355553333355115355355117155553333533333333553662222266355111282844444711111115115333351",
            "7447441111355555222666222888266665555555333333666666335555555355551111117171155333333333333333"
        ))
        .walk("633363333636663622666228888444444444477")
        .walk("77")
}

fn spend_act3_points(script: Script, times: u32) -> Script {
    script
        .spend(Ally::Rohane, Skill::Stun, times)
        .spend(Ally::Mipsy, Skill::GroupHaste, times)
        .spend(Ally::Talinia, Skill::MagicResist, times)
}

// Every act 3 chapter sets off from the same spot
const ACT3_DEPARTURE: &str = "3335553333333333";

fn siliclast() -> Script {
    let script = Script::new()
        .walk(ACT3_DEPARTURE)
        .walk("1117777774444444444")
        .walk("1111111155335111533333333333333551118226222222844477777777777744444")
        .grind(200);
    spend_act3_points(script, 4)
        .walk("4444444888882222222222284826333333333351511111")
        .walk("5")
        .walk("111111")
        .walk("44")
}

fn gebarn() -> Script {
    let script = Script::new()
        .walk(ACT3_DEPARTURE)
        .walk("111111111111774747711115511555155")
        .walk("511111111155551111533588822228448222263336263622844444444711174777111111111177744222226333")
        .grind(160);
    spend_act3_points(script, 2)
        .walk("3335111115626822222222663335551117477715553344444448666688882222228")
        .walk("2222")
        .walk("44")
}

fn revenant() -> Script {
    Script::new()
        .walk(ACT3_DEPARTURE)
        .walk("1111111111774747711115511555")
        .walk("111111157")
        .walk("24884")
        .talk(Npc::Velm)
        .spend(Ally::Velm, Skill::Heal, 11)
        .spend(Ally::Velm, Skill::GroupShield, 11)
        .spend(Ally::Velm, Skill::MeleeDefense, 11)
        .spend(Ally::Velm, Skill::CastingHaste, 4)
        .enable(Skill::Heal)
        .walk("3333555555555553333666666666666666666622226223355")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::party::skill_id;

    #[test]
    fn test_every_chapter_builds() {
        let all = chapters().unwrap();
        assert_eq!(all.len(), ChapterId::ALL.len());
        for chapter in &all {
            assert!(!chapter.steps.is_empty(), "{} is empty", chapter.id);
        }
    }

    #[test]
    fn test_grinds_are_even_and_skills_are_learnable() {
        for chapter in chapters().unwrap() {
            for step in &chapter.steps {
                match step {
                    Step::Grind { steps, .. } => {
                        assert_eq!(steps % 2, 0, "odd grind in {}", chapter.id)
                    }
                    Step::SpendSkill { ally, skill, .. } => {
                        assert!(skill_id(*ally, *skill).is_ok(), "{ally} {skill}")
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_home_training_expansion() {
        let chapter = ChapterId::HomeTraining.chapter().unwrap();
        let steps = &chapter.steps;

        assert_eq!(steps.first(), Some(&Step::Walk(Path::parse("3333").unwrap())));
        assert_eq!(steps[1], Step::SetMode(MovementMode::Hunting));
        assert_eq!(steps.last(), Some(&Step::SetMode(MovementMode::Normal)));

        // 30 single steps each followed by a trip home
        let rests = steps.iter().filter(|s| **s == Step::Talk(Npc::Mother)).count();
        assert_eq!(rests, 30);
        let singles = steps
            .iter()
            .filter(|s| **s == Step::Walk(Path::parse("7").unwrap()))
            .count();
        assert_eq!(singles, 30);
        let pairs = steps
            .iter()
            .filter(|s| **s == Step::Walk(Path::parse("12").unwrap()))
            .count();
        assert_eq!(pairs, 75);

        // Points at 15, 30, 60, 90, 120, 150 and 180 steps
        let points = steps
            .iter()
            .filter(|s| matches!(s, Step::SpendSkill { ally: Ally::Rohane, skill: Skill::MeleeHaste, times: 1 }))
            .count();
        assert_eq!(points, 7);
    }

    #[test]
    fn test_spells_enabled_after_recruiting() {
        let sand_grundo = ChapterId::SandGrundo.chapter().unwrap();
        assert_eq!(sand_grundo.steps[0], Step::Talk(Npc::Mipsy));
        assert!(sand_grundo.steps.contains(&Step::EnableSpell(Skill::DirectDamage)));

        let revenant = ChapterId::Revenant.chapter().unwrap();
        assert!(revenant.steps.contains(&Step::EnableSpell(Skill::Heal)));
    }

    #[test]
    fn test_chapter_lookup() {
        assert_eq!("zombom".parse::<ChapterId>().unwrap(), ChapterId::Zombom);
        assert_eq!("Caves of Terror".parse::<ChapterId>().unwrap(), ChapterId::CavesOfTerror);
        assert_eq!("1".parse::<ChapterId>().unwrap(), ChapterId::HomeTraining);
        assert_eq!("13".parse::<ChapterId>().unwrap(), ChapterId::Revenant);
        assert!("0".parse::<ChapterId>().is_err());
        assert!("14".parse::<ChapterId>().is_err());
        assert_eq!(ChapterId::Kolvars.act(), 2);
    }

    #[test]
    fn test_bad_path_is_reported() {
        let err = Script::new().walk("12").walk("19").finish().unwrap_err();
        assert!(matches!(err, AutoplayerError::InvalidArgument(_)));
    }

    #[test]
    fn test_planned_steps_counts_grind_detours() {
        let chapter = Chapter {
            id: ChapterId::Leximp,
            title: "",
            steps: vec![
                Step::Walk(Path::parse("44").unwrap()),
                Step::Grind {
                    steps: 10,
                    initial_path: Some(Path::parse("78").unwrap()),
                },
                Step::Talk(Npc::Mother),
            ],
        };
        assert_eq!(chapter.planned_steps(), 16);
    }
}
