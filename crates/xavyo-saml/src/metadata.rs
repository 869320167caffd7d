//! SAML 2.0 service provider metadata parsing
//!
//! Extracts the parts of an `EntityDescriptor` needed to register a service
//! provider: entity id, assertion consumer services, single logout endpoints,
//! name-ID format, signing certificate, and the attribute consuming service.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::MetadataError;
use crate::models::dto::decode_certificate;
use crate::models::ServiceProviderRecord;

/// Maximum accepted metadata document size in bytes.
pub const MAX_METADATA_SIZE: usize = 512 * 1024;

/// Turns an SP metadata document into a service provider record.
pub trait MetadataParser: Send + Sync {
    /// Parse `xml` into an unnormalized record keyed by the entity id.
    fn parse(&self, xml: &str) -> Result<ServiceProviderRecord, MetadataError>;
}

/// Metadata parser backed by `quick-xml`.
#[derive(Debug, Clone)]
pub struct SpMetadataParser {
    max_size: usize,
}

impl Default for SpMetadataParser {
    fn default() -> Self {
        Self {
            max_size: MAX_METADATA_SIZE,
        }
    }
}

/// Text content currently being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    NameIdFormat,
    Certificate,
}

#[derive(Debug, Default)]
struct ParseState {
    entity_id: Option<String>,
    entity_closed: bool,
    sp_descriptor_seen: bool,
    in_sp_descriptor: bool,
    key_use: Option<String>,
    acs_urls: Vec<String>,
    default_acs: Option<String>,
    slo_request_url: Option<String>,
    slo_response_url: Option<String>,
    name_id_format: Option<String>,
    signing_certificate: Option<String>,
    fallback_certificate: Option<String>,
    certificate_text: String,
    authn_requests_signed: bool,
    attribute_index: Option<String>,
    requested_claims: Vec<String>,
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|attr| {
        let key = attr.key.local_name();
        (key.as_ref() == name.as_bytes())
            .then(|| attr.unescape_value().unwrap_or_default().to_string())
    })
}

impl SpMetadataParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the maximum accepted document size.
    #[must_use]
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    fn on_start(state: &mut ParseState, e: &BytesStart<'_>, capture: &mut Capture) {
        let local_name = e.local_name();
        let name = std::str::from_utf8(local_name.as_ref()).unwrap_or("");

        match name {
            "EntityDescriptor" => {
                if state.entity_id.is_none() {
                    state.entity_id = attribute(e, "entityID").filter(|id| !id.trim().is_empty());
                }
            }
            "SPSSODescriptor" => {
                state.sp_descriptor_seen = true;
                state.in_sp_descriptor = true;
                state.authn_requests_signed =
                    attribute(e, "AuthnRequestsSigned").is_some_and(|v| v == "true");
            }
            _ if !state.in_sp_descriptor => {}
            "AssertionConsumerService" => {
                if let Some(location) = attribute(e, "Location").filter(|l| !l.trim().is_empty()) {
                    if attribute(e, "isDefault").is_some_and(|v| v == "true")
                        && state.default_acs.is_none()
                    {
                        state.default_acs = Some(location.clone());
                    }
                    state.acs_urls.push(location);
                }
            }
            "SingleLogoutService" => {
                if state.slo_request_url.is_none() {
                    state.slo_request_url = attribute(e, "Location");
                    state.slo_response_url = attribute(e, "ResponseLocation");
                }
            }
            "KeyDescriptor" => {
                state.key_use = attribute(e, "use");
            }
            "X509Certificate" => {
                state.certificate_text.clear();
                *capture = Capture::Certificate;
            }
            "NameIDFormat" => *capture = Capture::NameIdFormat,
            "AttributeConsumingService" => {
                if state.attribute_index.is_none() {
                    state.attribute_index = attribute(e, "index");
                }
            }
            "RequestedAttribute" => {
                if let Some(claim) = attribute(e, "Name") {
                    state.requested_claims.push(claim);
                }
            }
            _ => {}
        }
    }

    fn on_end(state: &mut ParseState, name: &str, capture: &mut Capture) {
        match name {
            "EntityDescriptor" => state.entity_closed = true,
            "SPSSODescriptor" => state.in_sp_descriptor = false,
            "KeyDescriptor" => state.key_use = None,
            "X509Certificate" if *capture == Capture::Certificate => {
                let text = std::mem::take(&mut state.certificate_text);
                let is_encryption = state.key_use.as_deref() == Some("encryption");
                if is_encryption {
                    state.fallback_certificate.get_or_insert(text);
                } else {
                    state.signing_certificate.get_or_insert(text);
                }
                *capture = Capture::None;
            }
            "NameIDFormat" => *capture = Capture::None,
            _ => {}
        }
    }
}

impl MetadataParser for SpMetadataParser {
    fn parse(&self, xml: &str) -> Result<ServiceProviderRecord, MetadataError> {
        if xml.len() > self.max_size {
            return Err(MetadataError::TooLarge {
                size: xml.len(),
                max: self.max_size,
            });
        }

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut state = ParseState::default();
        let mut capture = Capture::None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => Self::on_start(&mut state, &e, &mut capture),
                Ok(Event::Empty(e)) => {
                    Self::on_start(&mut state, &e, &mut capture);
                    let local_name = e.local_name();
                    let name = std::str::from_utf8(local_name.as_ref()).unwrap_or("");
                    Self::on_end(&mut state, name, &mut capture);
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|e| MetadataError::Xml(e.to_string()))?;
                    match capture {
                        Capture::Certificate => state.certificate_text.push_str(&text),
                        Capture::NameIdFormat if state.name_id_format.is_none() => {
                            state.name_id_format = Some(text.trim().to_string());
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => {
                    let local_name = e.local_name();
                    let name = std::str::from_utf8(local_name.as_ref()).unwrap_or("");
                    Self::on_end(&mut state, name, &mut capture);
                    // Only the first entity of an EntitiesDescriptor is read
                    if state.entity_closed {
                        break;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(MetadataError::Xml(e.to_string())),
                _ => {}
            }
        }

        let entity_id = state.entity_id.ok_or(MetadataError::MissingEntityId)?;
        if !state.sp_descriptor_seen {
            return Err(MetadataError::MissingSpDescriptor);
        }
        if state.acs_urls.is_empty() {
            return Err(MetadataError::MissingAssertionConsumerService);
        }

        let mut record = ServiceProviderRecord::new(entity_id);
        record.default_assertion_consumer_url = state
            .default_acs
            .or_else(|| state.acs_urls.first().cloned());
        record.assertion_consumer_urls = state.acs_urls;
        record.do_single_logout = state.slo_request_url.is_some();
        record.slo_response_url = state.slo_response_url.or(state.slo_request_url.clone());
        record.slo_request_url = state.slo_request_url;
        record.name_id_format = state.name_id_format.unwrap_or_default();
        record.do_validate_signature_in_requests = state.authn_requests_signed;
        record.requested_claims = state.requested_claims;
        if let Some(index) = state.attribute_index.filter(|i| !i.trim().is_empty()) {
            record.attribute_consuming_service_index = index;
        }

        if let Some(text) = state.signing_certificate.or(state.fallback_certificate) {
            let cert = decode_certificate(&text).map_err(MetadataError::InvalidCertificate)?;
            record
                .set_certificate(&cert)
                .map_err(|e| MetadataError::InvalidCertificate(e.to_string()))?;
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"<?xml version="1.0"?>
<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="https://sp.example.com">
  <md:SPSSODescriptor AuthnRequestsSigned="true" protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
    <md:SingleLogoutService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect" Location="https://sp.example.com/slo"/>
    <md:NameIDFormat>urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress</md:NameIDFormat>
    <md:AssertionConsumerService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST" Location="https://sp.example.com/acs" index="0"/>
    <md:AssertionConsumerService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST" Location="https://sp.example.com/acs2" index="1" isDefault="true"/>
    <md:AttributeConsumingService index="3">
      <md:ServiceName xml:lang="en">Example</md:ServiceName>
      <md:RequestedAttribute Name="http://wso2.org/claims/emailaddress"/>
    </md:AttributeConsumingService>
  </md:SPSSODescriptor>
</md:EntityDescriptor>"#;

    #[test]
    fn test_parse_minimal_metadata() {
        let record = SpMetadataParser::new().parse(MINIMAL).unwrap();
        assert_eq!(record.issuer, "https://sp.example.com");
        assert_eq!(record.assertion_consumer_urls.len(), 2);
        assert_eq!(
            record.default_assertion_consumer_url.as_deref(),
            Some("https://sp.example.com/acs2")
        );
        assert!(record.do_single_logout);
        assert_eq!(record.slo_request_url.as_deref(), Some("https://sp.example.com/slo"));
        assert_eq!(
            record.name_id_format,
            "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"
        );
        assert!(record.do_validate_signature_in_requests);
        assert_eq!(record.attribute_consuming_service_index, "3");
        assert_eq!(record.requested_claims, vec!["http://wso2.org/claims/emailaddress"]);
        assert!(record.certificate.is_none());
    }

    #[test]
    fn test_missing_parts() {
        let parser = SpMetadataParser::new();
        assert_eq!(
            parser.parse(r#"<EntityDescriptor><SPSSODescriptor/></EntityDescriptor>"#),
            Err(MetadataError::MissingEntityId)
        );
        assert_eq!(
            parser.parse(r#"<EntityDescriptor entityID="idp"><IDPSSODescriptor/></EntityDescriptor>"#),
            Err(MetadataError::MissingSpDescriptor)
        );
        assert_eq!(
            parser.parse(r#"<EntityDescriptor entityID="sp"><SPSSODescriptor/></EntityDescriptor>"#),
            Err(MetadataError::MissingAssertionConsumerService)
        );
    }

    #[test]
    fn test_acs_outside_sp_descriptor_ignored() {
        let xml = r#"<EntityDescriptor entityID="sp">
            <IDPSSODescriptor><AssertionConsumerService Location="https://idp/acs"/></IDPSSODescriptor>
            <SPSSODescriptor/>
        </EntityDescriptor>"#;
        assert_eq!(
            SpMetadataParser::new().parse(xml),
            Err(MetadataError::MissingAssertionConsumerService)
        );
    }

    #[test]
    fn test_malformed_xml() {
        let result = SpMetadataParser::new().parse("<EntityDescriptor entityID=\"sp\"><SPSSODescriptor></Wrong>");
        assert!(matches!(result, Err(MetadataError::Xml(_))));
    }

    #[test]
    fn test_size_limit() {
        let parser = SpMetadataParser::new().with_max_size(16);
        assert_eq!(
            parser.parse(MINIMAL),
            Err(MetadataError::TooLarge {
                size: MINIMAL.len(),
                max: 16
            })
        );
    }

    #[test]
    fn test_invalid_certificate() {
        let xml = r#"<EntityDescriptor entityID="sp"><SPSSODescriptor>
            <KeyDescriptor use="signing"><KeyInfo><X509Data><X509Certificate>bm90IGEgY2VydA==</X509Certificate></X509Data></KeyInfo></KeyDescriptor>
            <AssertionConsumerService Location="https://sp/acs"/>
        </SPSSODescriptor></EntityDescriptor>"#;
        assert!(matches!(
            SpMetadataParser::new().parse(xml),
            Err(MetadataError::InvalidCertificate(_))
        ));
    }
}
