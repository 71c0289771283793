use serde::{Deserialize, Serialize};

pub const MISSING_FIELDS: &str = "Dados obrigatórios faltando";
pub const CPF_FOUND: &str = "CPF encontrado na base de dados";
pub const CPF_NOT_FOUND: &str = "CPF não encontrado na base de dados";

#[derive(Debug, Default, Deserialize)]
pub struct CpfCheckRequest {
    #[serde(rename = "TERMO", default)]
    pub termo: Option<String>,
}

impl CpfCheckRequest {
    /// The search term reduced to digits, `None` when it has none.
    pub fn digits(&self) -> Option<String> {
        let digits = crate::clients::repo::cpf_digits(self.termo.as_deref()?);
        (!digits.is_empty()).then_some(digits)
    }
}

#[derive(Debug, Serialize)]
pub struct CpfCheckResponse {
    pub success: bool,
    pub exists: bool,
    pub message: &'static str,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl CpfCheckResponse {
    pub fn new(exists: bool) -> Self {
        Self {
            success: true,
            exists,
            message: if exists { CPF_FOUND } else { CPF_NOT_FOUND },
            status_code: 200,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MissingFieldsResponse {
    pub error: &'static str,
    pub required: &'static [&'static str],
}

impl Default for MissingFieldsResponse {
    fn default() -> Self {
        Self {
            error: MISSING_FIELDS,
            required: &["TERMO"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(termo: Option<&str>) -> CpfCheckRequest {
        CpfCheckRequest {
            termo: termo.map(str::to_string),
        }
    }

    #[test]
    fn blank_term_counts_as_missing() {
        assert_eq!(req(None).digits(), None);
        assert_eq!(req(Some("   ")).digits(), None);
        assert_eq!(req(Some("abc")).digits(), None);
        assert_eq!(req(Some("123.456.789-00")).digits().as_deref(), Some("12345678900"));
    }

    #[test]
    fn reads_uppercase_field_name() {
        let parsed: CpfCheckRequest = serde_json::from_str(r#"{"TERMO":"12345678900"}"#).unwrap();
        assert_eq!(parsed.termo.as_deref(), Some("12345678900"));
        let empty: CpfCheckRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.termo.is_none());
    }

    #[test]
    fn response_uses_camel_case_status() {
        let json = serde_json::to_value(CpfCheckResponse::new(false)).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["exists"], false);
        assert_eq!(json["message"], CPF_NOT_FOUND);
    }
}
