use engine::CuePlayback;
use tracing::{debug, info};

use super::cues;
use super::services::Services;
use super::types::TutorialStage;
use super::world::Anchor;

const PICKUP_DELAY_SECONDS: f32 = 0.5;
const TUTORIAL_SETTLE_SECONDS: f32 = 1.0;
const HANGUP_SETTLE_SECONDS: f32 = 0.5;
const AFTER_CALL_SECONDS: f32 = 10.0;

/// The scripted call after the phone is answered. Progress is detected by
/// polling whether the current line is still playing. The call counts as
/// finished only after a quiet spell following the hang-up.
#[derive(Debug, Clone, Default)]
pub(crate) struct PhoneTutorial {
    stage: TutorialStage,
    timer: f32,
}

impl PhoneTutorial {
    pub(crate) fn stage(&self) -> TutorialStage {
        self.stage
    }

    pub(crate) fn is_done(&self) -> bool {
        self.stage == TutorialStage::Done
    }

    pub(crate) fn reset(&mut self) {
        self.stage = TutorialStage::None;
        self.timer = 0.0;
    }

    /// Phone picked up: the call starts after a short delay.
    pub(crate) fn pick_up(&mut self) {
        self.stage = TutorialStage::Pickup;
        self.timer = 0.0;
    }

    /// Restores a saved stage. A call interrupted mid-line restarts that line.
    pub(crate) fn restore(&mut self, stage: TutorialStage) {
        self.stage = match stage {
            TutorialStage::Pickup | TutorialStage::WaitTutorial => TutorialStage::StartTutorial,
            TutorialStage::WaitHangup => TutorialStage::StartHangup,
            other => other,
        };
        self.timer = 0.0;
    }

    /// Cuts the tutorial line short and goes straight to the hang-up.
    pub(crate) fn skip(&mut self, services: &mut Services) -> bool {
        if !matches!(
            self.stage,
            TutorialStage::StartTutorial | TutorialStage::WaitTutorial
        ) {
            return false;
        }
        services.stop(cues::PHONE_TUTORIAL);
        info!("phone_tutorial_skipped");
        self.stage = TutorialStage::StartHangup;
        self.timer = 0.0;
        true
    }

    /// Returns true on the tick the call ends.
    pub(crate) fn update(&mut self, dt: f32, services: &mut Services) -> bool {
        let next = match self.stage {
            TutorialStage::None | TutorialStage::Done => return false,
            TutorialStage::Pickup => {
                self.timer += dt;
                if self.timer > PICKUP_DELAY_SECONDS {
                    TutorialStage::StartTutorial
                } else {
                    TutorialStage::Pickup
                }
            }
            TutorialStage::StartTutorial => {
                services.play_global(cues::PHONE_TUTORIAL, CuePlayback::default());
                self.timer = 0.0;
                TutorialStage::WaitTutorial
            }
            TutorialStage::WaitTutorial => {
                self.timer += dt;
                if self.timer > TUTORIAL_SETTLE_SECONDS && !services.is_playing(cues::PHONE_TUTORIAL)
                {
                    TutorialStage::StartHangup
                } else {
                    TutorialStage::WaitTutorial
                }
            }
            TutorialStage::StartHangup => {
                services.play_at(
                    cues::PHONE_HANGUP,
                    Anchor::Phone,
                    1.0,
                    CuePlayback::at_volume(4.0),
                );
                self.timer = 0.0;
                TutorialStage::WaitHangup
            }
            TutorialStage::WaitHangup => {
                self.timer += dt;
                if self.timer > HANGUP_SETTLE_SECONDS && !services.is_playing(cues::PHONE_HANGUP) {
                    self.timer = 0.0;
                    TutorialStage::Grace
                } else {
                    TutorialStage::WaitHangup
                }
            }
            TutorialStage::Grace => {
                self.timer += dt;
                if self.timer >= AFTER_CALL_SECONDS {
                    TutorialStage::Done
                } else {
                    TutorialStage::Grace
                }
            }
        };

        if next != self.stage {
            debug!(from = ?self.stage, to = ?next, "tutorial_stage");
            self.stage = next;
            if next == TutorialStage::Done {
                info!("phone_call_finished");
                return true;
            }
        }
        false
    }
}
