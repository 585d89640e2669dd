pub mod dispatch;
pub mod grouper;
pub mod renderer;
pub mod validator;
