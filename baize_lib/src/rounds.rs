use std::fmt;

use serde::{Deserialize, Serialize};

use crate::levels::Level;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// The label of one round of an entity's bracket. Elimination rounds are
/// `R1, R2, …`; once the pool collapses to four or fewer players the
/// positioning phases take over. The legacy variants are accepted when
/// reading persisted brackets written by older generators and are never
/// produced by this one.
pub enum RoundLabel {
    /// `Rn` — an ordinary elimination round
    Round(u32),
    /// `<Level>_SF` — the semi-finals (two matches for four players, one
    /// match plus a waiting player for three)
    SemiFinal,
    /// `<Level>_WF` — winners of the semi-finals
    WinnersFinal,
    /// `<Level>_LF` — losers of the semi-finals
    LosersFinal,
    /// `<Level>_F` — the last match of the four-player scheme
    FourPlayerFinal,
    /// `<Level>_Final` — a direct final (pools of three or fewer)
    Final,
    /// `<Level>_WB` — legacy winners-bracket round
    LegacyWinnersBracket,
    /// `<Level>_LB` — legacy losers-bracket round
    LegacyLosersBracket,
    /// `<Level>_3WS` — legacy three-way semi
    LegacyThreeWaySemi,
}

impl RoundLabel {
    /// The label string used in match ids, match records, and bracket keys
    pub fn as_string(&self, level: Level) -> String {
        use RoundLabel::*;
        match self {
            Round(n) => format!("R{n}"),
            SemiFinal => format!("{}_SF", level.display_name()),
            WinnersFinal => format!("{}_WF", level.display_name()),
            LosersFinal => format!("{}_LF", level.display_name()),
            FourPlayerFinal => format!("{}_F", level.display_name()),
            Final => format!("{}_Final", level.display_name()),
            LegacyWinnersBracket => format!("{}_WB", level.display_name()),
            LegacyLosersBracket => format!("{}_LB", level.display_name()),
            LegacyThreeWaySemi => format!("{}_3WS", level.display_name()),
        }
    }

    /// Parses a persisted label string. Unknown strings yield `None` so a
    /// foreign document cannot wedge the state machine.
    pub fn parse(label: &str) -> Option<RoundLabel> {
        use RoundLabel::*;
        if let Some(digits) = label.strip_prefix('R') {
            if let Ok(n) = digits.parse::<u32>() {
                return Some(Round(n));
            }
        }
        let (_, tag) = label.rsplit_once('_')?;
        match tag {
            "SF" => Some(SemiFinal),
            "WF" => Some(WinnersFinal),
            "LF" => Some(LosersFinal),
            "F" => Some(FourPlayerFinal),
            "Final" => Some(Final),
            "WB" => Some(LegacyWinnersBracket),
            "LB" => Some(LegacyLosersBracket),
            "3WS" => Some(LegacyThreeWaySemi),
            _ => None,
        }
    }

    /// The progression stage this label belongs to
    pub fn stage(&self) -> RoundStage {
        use RoundLabel::*;
        match self {
            Round(n) => RoundStage::Elimination(*n),
            SemiFinal | LegacyThreeWaySemi => RoundStage::SemiFinals,
            WinnersFinal | LosersFinal | LegacyWinnersBracket | LegacyLosersBracket => {
                RoundStage::BracketFinals
            }
            FourPlayerFinal | Final => RoundStage::Finals,
        }
    }
}

impl fmt::Display for RoundLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RoundLabel::*;
        match self {
            Round(n) => write!(f, "R{n}"),
            SemiFinal => write!(f, "SF"),
            WinnersFinal => write!(f, "WF"),
            LosersFinal => write!(f, "LF"),
            FourPlayerFinal => write!(f, "F"),
            Final => write!(f, "Final"),
            LegacyWinnersBracket => write!(f, "WB"),
            LegacyLosersBracket => write!(f, "LB"),
            LegacyThreeWaySemi => write!(f, "3WS"),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// Progression stages in the order the state machine walks them. The winners
/// and losers finals are generated together and complete as one stage.
/// The derived ordering is what drives current-round auto-detection:
/// finals beat the bracket finals, which beat the semi-finals, which beat
/// every elimination round; among elimination rounds the higher number wins.
pub enum RoundStage {
    Elimination(u32),
    SemiFinals,
    BracketFinals,
    Finals,
}
