//! Decide what a reply means for a pending session

use convert_types::{ExtensionCatalog, PayloadKind, RejectReason, Resolution, SpecialOp};

use crate::store::Session;

/// Pure mapping from `(session, reply)` to a [`Resolution`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchResolver {
    catalog: ExtensionCatalog,
}

impl DispatchResolver {
    pub fn new(catalog: ExtensionCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ExtensionCatalog {
        &self.catalog
    }

    /// Resolve a reply.
    ///
    /// Rules, first match wins:
    /// 1. text payloads have no family and are never converted here
    /// 2. an exact special-op keyword the payload's family offers is a special op;
    ///    any other keyword is treated like an extension below
    /// 3. a payload without an extension cannot be converted
    /// 4. a target equal to the source extension (ignoring case) is refused
    /// 5. anything else is a conversion to the lowercased reply
    pub fn resolve(&self, session: &Session, reply: &str) -> Resolution {
        let reply = reply.trim();

        if session.payload_kind == PayloadKind::Text {
            return Resolution::rejected(RejectReason::UnsupportedPayload);
        }

        let source_ext = session.source_extension();

        if let Some(op) = SpecialOp::from_token(reply) {
            let family = self
                .catalog
                .family_for(session.payload_kind, source_ext.as_deref());
            if family.is_some_and(|family| self.catalog.is_special_op(family, reply)) {
                return Resolution::special(op);
            }
        }

        let Some(source_ext) = source_ext else {
            return Resolution::rejected(RejectReason::UnparseableFilename);
        };

        let target = reply.trim_start_matches('.');
        if target.is_empty() {
            return Resolution::rejected(RejectReason::UnparseableFilename);
        }
        if source_ext.eq_ignore_ascii_case(target) {
            return Resolution::rejected(RejectReason::SameExtension);
        }

        Resolution::conversion(source_ext.to_lowercase(), target.to_lowercase())
    }
}
