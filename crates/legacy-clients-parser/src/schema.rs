/// Header cell carrying the legacy system's client key.
pub const IDENTIFIER_COLUMN: &str = "idCLIENTES";

/// Target column used for conflict detection at the destination.
pub const IDENTIFIER_TARGET: &str = "legacy_client_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Identifier,
    Text,
    Flag,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientField {
    LegacyClientId,
    Descricao,
    DescricaoFantasia,
    Endereco,
    Numero,
    Complemento,
    Bairro,
    Cidade,
    Pais,
    Uf,
    Cep,
    Telefone1,
    Telefone2,
    Telefone3,
    Telefone4,
    Email,
    EmailContratos,
    Pessoa,
    Grupo1,
    Grupo2,
    Referencias,
    Obs,
    Documento1,
    Documento2,
    Documento3,
    Ativo,
    IdUsuario,
    IdUsuarioUltimo,
    Logo,
    LogoAltura,
    LogoLargura,
    AutoSize,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub field: ClientField,
    pub source: &'static str,
    pub target: &'static str,
    pub kind: ColumnKind,
}

const fn column(
    field: ClientField,
    source: &'static str,
    target: &'static str,
    kind: ColumnKind,
) -> ColumnSpec {
    ColumnSpec {
        field,
        source,
        target,
        kind,
    }
}

pub const COLUMN_COUNT: usize = 32;

/// Export header → destination column mapping, in destination column order.
pub const CLIENT_COLUMNS: [ColumnSpec; COLUMN_COUNT] = {
    use ClientField::*;
    use ColumnKind::*;
    [
        column(LegacyClientId, IDENTIFIER_COLUMN, IDENTIFIER_TARGET, Identifier),
        column(Descricao, "DESCRICAO", "descricao", Text),
        column(DescricaoFantasia, "DESCRICAOFANTASIA", "descricao_fantasia", Text),
        column(Endereco, "ENDERECO", "endereco", Text),
        column(Numero, "NUMERO", "numero", Text),
        column(Complemento, "COMPLEMENTO", "complemento", Text),
        column(Bairro, "BAIRRO", "bairro", Text),
        column(Cidade, "CIDADE", "cidade", Text),
        column(Pais, "PAIS", "pais", Text),
        column(Uf, "UF", "uf", Text),
        column(Cep, "CEP", "cep", Text),
        column(Telefone1, "TELEFONE1", "telefone1", Text),
        column(Telefone2, "TELEFONE2", "telefone2", Text),
        column(Telefone3, "TELEFONE3", "telefone3", Text),
        column(Telefone4, "TELEFONE4", "telefone4", Text),
        column(Email, "EMAIL", "email", Text),
        column(EmailContratos, "EMAILCONTRATOS", "email_contratos", Text),
        column(Pessoa, "PESSOA", "pessoa", Text),
        column(Grupo1, "GRUPO1", "grupo1", Text),
        column(Grupo2, "GRUPO2", "grupo2", Text),
        column(Referencias, "REFERENCIAS", "referencias", Text),
        column(Obs, "OBS", "obs", Text),
        column(Documento1, "DOCUMENTO1", "documento1", Text),
        column(Documento2, "DOCUMENTO2", "documento2", Text),
        column(Documento3, "DOCUMENTO3", "documento3", Text),
        column(Ativo, "ATIVO", "ativo", Flag),
        column(IdUsuario, "IDUSUARIO", "id_usuario", Integer),
        column(IdUsuarioUltimo, "IDUSUARIOULTIMO", "id_usuario_ultimo", Integer),
        column(Logo, "LOGO", "logo", Text),
        column(LogoAltura, "LOGOALTURA", "logo_altura", Integer),
        column(LogoLargura, "LOGOLARGURA", "logo_largura", Integer),
        column(AutoSize, "AUTOSIZE", "auto_size", Flag),
    ]
};

pub fn target_columns() -> impl Iterator<Item = &'static str> {
    CLIENT_COLUMNS.iter().map(|spec| spec.target)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn identifier_leads_column_order() {
        assert_eq!(CLIENT_COLUMNS[0].field, ClientField::LegacyClientId);
        assert_eq!(CLIENT_COLUMNS[0].kind, ColumnKind::Identifier);
        assert_eq!(
            CLIENT_COLUMNS
                .iter()
                .filter(|spec| spec.kind == ColumnKind::Identifier)
                .count(),
            1
        );
    }

    #[test]
    fn source_and_target_names_are_unique() {
        let sources: HashSet<_> = CLIENT_COLUMNS.iter().map(|spec| spec.source).collect();
        let targets: HashSet<_> = target_columns().collect();
        assert_eq!(sources.len(), COLUMN_COUNT);
        assert_eq!(targets.len(), COLUMN_COUNT);
    }
}
