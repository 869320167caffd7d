//! Service provider models

pub mod dto;
pub mod normalize;
pub mod record;

pub use dto::{ServiceProviderDto, ServiceProviderInfo};
pub use normalize::{
    external_name_id_format, generate_attribute_index, internal_name_id_format, normalize,
    NAME_ID_FORMAT_UNSPECIFIED,
};
pub use record::{issuer_with_qualifier, ServiceProviderRecord, ISSUER_QUALIFIER_SEPARATOR};
