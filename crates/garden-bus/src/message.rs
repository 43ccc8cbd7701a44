use garden_core::{Data, Input, ResultError, Work, WorkResult};

/// The closed set of message variants that flow across the bus. The
/// original relies on introspected interfaces and a global adapter
/// registry to decide which handlers a message reaches; here the set of
/// provided types is a property of the sum type itself.
#[derive(Debug, Clone)]
pub enum GardenMessage {
    Input(Input),
    Data(Data),
    Work(Work),
    Result(WorkResult),
    ResultError(ResultError),
}

/// The discriminant of a [`GardenMessage`], used to match a `Source`'s
/// advertised types against a `Receiver`'s mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Input,
    Data,
    Work,
    Result,
    ResultError,
}

impl GardenMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            GardenMessage::Input(_) => MessageKind::Input,
            GardenMessage::Data(_) => MessageKind::Data,
            GardenMessage::Work(_) => MessageKind::Work,
            GardenMessage::Result(_) => MessageKind::Result,
            GardenMessage::ResultError(_) => MessageKind::ResultError,
        }
    }
}

impl From<Input> for GardenMessage {
    fn from(v: Input) -> Self {
        GardenMessage::Input(v)
    }
}

impl From<Data> for GardenMessage {
    fn from(v: Data) -> Self {
        GardenMessage::Data(v)
    }
}

impl From<Work> for GardenMessage {
    fn from(v: Work) -> Self {
        GardenMessage::Work(v)
    }
}

impl From<WorkResult> for GardenMessage {
    fn from(v: WorkResult) -> Self {
        GardenMessage::Result(v)
    }
}

impl From<ResultError> for GardenMessage {
    fn from(v: ResultError) -> Self {
        GardenMessage::ResultError(v)
    }
}
