use serde::Serialize;

use crate::schema::{ClientField, ColumnSpec, CLIENT_COLUMNS};

/// A single client row from the legacy export, normalized.
///
/// Optional fields are either `None` or hold a trimmed, non-empty value.
/// Serialized field names match the destination table's columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyClientRecord {
    pub legacy_client_id: i64,
    pub descricao: Option<String>,
    pub descricao_fantasia: Option<String>,
    pub endereco: Option<String>,
    pub numero: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub cidade: Option<String>,
    pub pais: Option<String>,
    pub uf: Option<String>,
    pub cep: Option<String>,
    pub telefone1: Option<String>,
    pub telefone2: Option<String>,
    pub telefone3: Option<String>,
    pub telefone4: Option<String>,
    pub email: Option<String>,
    pub email_contratos: Option<String>,
    pub pessoa: Option<String>,
    pub grupo1: Option<String>,
    pub grupo2: Option<String>,
    pub referencias: Option<String>,
    pub obs: Option<String>,
    pub documento1: Option<String>,
    pub documento2: Option<String>,
    pub documento3: Option<String>,
    pub ativo: Option<bool>,
    pub id_usuario: Option<i64>,
    pub id_usuario_ultimo: Option<i64>,
    pub logo: Option<String>,
    pub logo_altura: Option<i64>,
    pub logo_largura: Option<i64>,
    pub auto_size: Option<bool>,
}

/// Borrowed, typed view of one column of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Integer(Option<i64>),
    Text(Option<&'a str>),
    Flag(Option<bool>),
}

impl FieldValue<'_> {
    pub fn is_absent(&self) -> bool {
        match self {
            FieldValue::Integer(value) => value.is_none(),
            FieldValue::Text(value) => value.is_none(),
            FieldValue::Flag(value) => value.is_none(),
        }
    }
}

impl LegacyClientRecord {
    /// A record with only the identifier set.
    pub fn new(legacy_client_id: i64) -> Self {
        Self {
            legacy_client_id,
            descricao: None,
            descricao_fantasia: None,
            endereco: None,
            numero: None,
            complemento: None,
            bairro: None,
            cidade: None,
            pais: None,
            uf: None,
            cep: None,
            telefone1: None,
            telefone2: None,
            telefone3: None,
            telefone4: None,
            email: None,
            email_contratos: None,
            pessoa: None,
            grupo1: None,
            grupo2: None,
            referencias: None,
            obs: None,
            documento1: None,
            documento2: None,
            documento3: None,
            ativo: None,
            id_usuario: None,
            id_usuario_ultimo: None,
            logo: None,
            logo_altura: None,
            logo_largura: None,
            auto_size: None,
        }
    }

    pub fn value(&self, field: ClientField) -> FieldValue<'_> {
        use ClientField::*;
        use FieldValue::{Flag, Integer, Text};

        match field {
            LegacyClientId => Integer(Some(self.legacy_client_id)),
            Descricao => Text(self.descricao.as_deref()),
            DescricaoFantasia => Text(self.descricao_fantasia.as_deref()),
            Endereco => Text(self.endereco.as_deref()),
            Numero => Text(self.numero.as_deref()),
            Complemento => Text(self.complemento.as_deref()),
            Bairro => Text(self.bairro.as_deref()),
            Cidade => Text(self.cidade.as_deref()),
            Pais => Text(self.pais.as_deref()),
            Uf => Text(self.uf.as_deref()),
            Cep => Text(self.cep.as_deref()),
            Telefone1 => Text(self.telefone1.as_deref()),
            Telefone2 => Text(self.telefone2.as_deref()),
            Telefone3 => Text(self.telefone3.as_deref()),
            Telefone4 => Text(self.telefone4.as_deref()),
            Email => Text(self.email.as_deref()),
            EmailContratos => Text(self.email_contratos.as_deref()),
            Pessoa => Text(self.pessoa.as_deref()),
            Grupo1 => Text(self.grupo1.as_deref()),
            Grupo2 => Text(self.grupo2.as_deref()),
            Referencias => Text(self.referencias.as_deref()),
            Obs => Text(self.obs.as_deref()),
            Documento1 => Text(self.documento1.as_deref()),
            Documento2 => Text(self.documento2.as_deref()),
            Documento3 => Text(self.documento3.as_deref()),
            Ativo => Flag(self.ativo),
            IdUsuario => Integer(self.id_usuario),
            IdUsuarioUltimo => Integer(self.id_usuario_ultimo),
            Logo => Text(self.logo.as_deref()),
            LogoAltura => Integer(self.logo_altura),
            LogoLargura => Integer(self.logo_largura),
            AutoSize => Flag(self.auto_size),
        }
    }

    /// All column values in destination column order.
    pub fn values(&self) -> impl Iterator<Item = (&'static ColumnSpec, FieldValue<'_>)> {
        CLIENT_COLUMNS
            .iter()
            .map(move |spec| (spec, self.value(spec.field)))
    }

    pub(crate) fn text_slot(&mut self, field: ClientField) -> Option<&mut Option<String>> {
        use ClientField::*;

        let slot = match field {
            Descricao => &mut self.descricao,
            DescricaoFantasia => &mut self.descricao_fantasia,
            Endereco => &mut self.endereco,
            Numero => &mut self.numero,
            Complemento => &mut self.complemento,
            Bairro => &mut self.bairro,
            Cidade => &mut self.cidade,
            Pais => &mut self.pais,
            Uf => &mut self.uf,
            Cep => &mut self.cep,
            Telefone1 => &mut self.telefone1,
            Telefone2 => &mut self.telefone2,
            Telefone3 => &mut self.telefone3,
            Telefone4 => &mut self.telefone4,
            Email => &mut self.email,
            EmailContratos => &mut self.email_contratos,
            Pessoa => &mut self.pessoa,
            Grupo1 => &mut self.grupo1,
            Grupo2 => &mut self.grupo2,
            Referencias => &mut self.referencias,
            Obs => &mut self.obs,
            Documento1 => &mut self.documento1,
            Documento2 => &mut self.documento2,
            Documento3 => &mut self.documento3,
            Logo => &mut self.logo,
            _ => return None,
        };
        Some(slot)
    }

    pub(crate) fn flag_slot(&mut self, field: ClientField) -> Option<&mut Option<bool>> {
        match field {
            ClientField::Ativo => Some(&mut self.ativo),
            ClientField::AutoSize => Some(&mut self.auto_size),
            _ => None,
        }
    }

    pub(crate) fn integer_slot(&mut self, field: ClientField) -> Option<&mut Option<i64>> {
        match field {
            ClientField::IdUsuario => Some(&mut self.id_usuario),
            ClientField::IdUsuarioUltimo => Some(&mut self.id_usuario_ultimo),
            ClientField::LogoAltura => Some(&mut self.logo_altura),
            ClientField::LogoLargura => Some(&mut self.logo_largura),
            _ => None,
        }
    }
}
