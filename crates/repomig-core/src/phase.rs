use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Preview,
    Execute,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Preview => "preview",
            Self::Execute => "execute",
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::Prepare => Some(Self::Preview),
            Self::Preview => Some(Self::Execute),
            Self::Execute => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    Idle,
    Preparing,
    AwaitingConfirmation,
    InFlight,
    Advanced,
    Failed,
    Aborted,
}

impl PhaseState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::AwaitingConfirmation => "awaiting confirmation",
            Self::InFlight => "in flight",
            Self::Advanced => "advanced",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Begin,
    Abort,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error("cannot {action} while the {} phase is {}", .phase.label(), .state.label())]
    IllegalTransition {
        phase: Phase,
        state: PhaseState,
        action: &'static str,
    },
}

#[derive(Debug)]
pub struct PhaseController {
    phase: Phase,
    state: PhaseState,
    pending: Option<PendingAction>,
    resume_state: PhaseState,
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseController {
    pub fn new() -> Self {
        Self {
            phase: Phase::Prepare,
            state: PhaseState::Idle,
            pending: None,
            resume_state: PhaseState::Preparing,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn pending(&self) -> Option<PendingAction> {
        self.pending
    }

    pub fn activate(&mut self) -> Result<(), PhaseError> {
        self.expect(PhaseState::Idle, "activate")?;
        self.state = PhaseState::Preparing;
        Ok(())
    }

    pub fn request(&mut self, action: PendingAction) -> Result<(), PhaseError> {
        let allowed = self.state == PhaseState::Preparing
            || (self.state == PhaseState::Advanced && action == PendingAction::Abort);
        if !allowed {
            return Err(self.illegal("request confirmation"));
        }

        self.resume_state = self.state;
        self.pending = Some(action);
        self.state = PhaseState::AwaitingConfirmation;
        Ok(())
    }

    pub fn decline(&mut self) -> Result<(), PhaseError> {
        self.expect(PhaseState::AwaitingConfirmation, "decline")?;
        self.pending = None;
        self.state = self.resume_state;
        Ok(())
    }

    pub fn accept(&mut self) -> Result<PendingAction, PhaseError> {
        self.expect(PhaseState::AwaitingConfirmation, "accept")?;
        let action = self
            .pending
            .ok_or_else(|| self.illegal("accept without a pending action"))?;
        self.state = PhaseState::InFlight;
        Ok(action)
    }

    pub fn complete_failure(&mut self) -> Result<(), PhaseError> {
        self.expect(PhaseState::InFlight, "record a failed call")?;
        self.pending = None;
        self.state = self.resume_state;
        Ok(())
    }

    pub fn complete_success(&mut self) -> Result<PhaseState, PhaseError> {
        self.expect(PhaseState::InFlight, "record a successful call")?;
        let action = self
            .pending
            .take()
            .ok_or_else(|| self.illegal("complete without a pending action"))?;
        self.state = match action {
            PendingAction::Begin => PhaseState::Advanced,
            PendingAction::Abort => PhaseState::Aborted,
        };
        Ok(self.state)
    }

    pub fn advance_to(&mut self, phase: Phase) -> Result<(), PhaseError> {
        self.expect(PhaseState::Advanced, "enter the next phase")?;
        self.phase = phase;
        self.state = PhaseState::Idle;
        self.resume_state = PhaseState::Preparing;
        Ok(())
    }

    pub fn complete_monitoring(&mut self, success: bool) -> Result<PhaseState, PhaseError> {
        if !matches!(self.state, PhaseState::Preparing | PhaseState::Advanced) {
            return Err(self.illegal("conclude execution monitoring"));
        }
        self.state = if success {
            PhaseState::Advanced
        } else {
            PhaseState::Failed
        };
        Ok(self.state)
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Prepare;
        self.state = PhaseState::Idle;
        self.pending = None;
        self.resume_state = PhaseState::Preparing;
    }

    fn expect(&self, state: PhaseState, action: &'static str) -> Result<(), PhaseError> {
        if self.state == state {
            Ok(())
        } else {
            Err(self.illegal(action))
        }
    }

    fn illegal(&self, action: &'static str) -> PhaseError {
        PhaseError::IllegalTransition {
            phase: self.phase,
            state: self.state,
            action,
        }
    }
}
