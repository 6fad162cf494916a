//! Authenticode Content Builder (§4.2): the `SpcIndirectDataContent` and
//! its authenticated attributes.

pub mod attributes;
pub mod content;
pub mod oids;

pub use attributes::{build_authenticated_attributes, ProgramInfo, SpcStatementType};
pub use content::build_spc_indirect_data_content;
