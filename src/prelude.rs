pub use crate::catalogue::HaloArrays;
pub use crate::catalogue::HaloCatalogue;
pub use crate::catalogue::NOT_IN_HALO;
pub use crate::command_line_options::CommandLineOptions;
pub use crate::coordinator::run;
pub use crate::domain::DomainDecomposition;
pub use crate::energy::EnergyMethod;
pub use crate::parameters::FinderParameters;
pub use crate::parameters::ParameterFile;
pub use crate::snapshot::Snapshot;
pub use crate::snapshot::SnapshotAttrs;
pub use crate::snapshot::SnapshotError;
