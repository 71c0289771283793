//! User-facing strings shown by the sign-in and sign-up forms.

pub const EMAIL_REQUIRED: &str = "Email é obrigatório";
pub const EMAIL_INVALID: &str = "Digite um email válido";
pub const PASSWORD_REQUIRED: &str = "Senha é obrigatória";
pub const PASSWORD_MIN_LENGTH: &str = "Senha deve ter pelo menos 8 caracteres";
pub const PASSWORD_WEAK: &str =
    "Senha deve conter pelo menos 1 letra maiúscula, 1 minúscula e 1 número";
pub const NAME_REQUIRED: &str = "Nome é obrigatório";
pub const NAME_MIN_LENGTH: &str = "Nome deve ter pelo menos 2 caracteres";
pub const NAME_NEEDS_LETTER: &str = "Nome deve conter pelo menos uma letra";
pub const NAME_INVALID: &str = "Nome deve conter pelo menos uma letra e pode incluir números, espaços e caracteres especiais básicos";

pub const LOGIN_FIELDS_REQUIRED: &str = "Email e senha são obrigatórios!";
pub const REGISTER_FIELDS_REQUIRED: &str = "Todos os campos são obrigatórios.";
pub const INVALID_CREDENTIALS: &str = "Email ou senha incorretos";
pub const EMAIL_ALREADY_EXISTS: &str = "Este email já está cadastrado.";
pub const REGISTRATION_SUCCESS: &str = "Usuário cadastrado com sucesso!";
pub const SERVER_ERROR: &str = "Erro interno do servidor. Tente novamente.";
