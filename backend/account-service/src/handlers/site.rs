/// Site action handlers
///
/// Thin bindings between actix extractors and [`SiteController`]. A missing
/// or unparsable form body reaches the controller as `None`.
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::controller::{RequestContext, SiteController};
use crate::error::{AppError, Result};
use crate::forms::{
    ContactForm, LoginForm, PasswordResetRequestForm, ResendVerificationEmailForm,
    ResetPasswordInput, SignupForm,
};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SignupQuery {
    pub aff: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

fn controller(state: &AppState) -> &SiteController {
    &state.controller
}

pub async fn index(state: web::Data<AppState>, mut ctx: RequestContext) -> Result<HttpResponse> {
    let outcome = controller(&state).index(&mut ctx).await?;
    ctx.respond(outcome, &state.sessions).await
}

pub async fn login(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    form: Option<web::Form<LoginForm>>,
) -> Result<HttpResponse> {
    let outcome = controller(&state)
        .login(&mut ctx, form.map(web::Form::into_inner))
        .await?;
    ctx.respond(outcome, &state.sessions).await
}

pub async fn logout(state: web::Data<AppState>, mut ctx: RequestContext) -> Result<HttpResponse> {
    let outcome = controller(&state).logout(&mut ctx);
    ctx.respond(outcome, &state.sessions).await
}

pub async fn contact(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    form: Option<web::Form<ContactForm>>,
) -> Result<HttpResponse> {
    let outcome = controller(&state)
        .contact(&mut ctx, form.map(web::Form::into_inner))
        .await?;
    ctx.respond(outcome, &state.sessions).await
}

pub async fn signup(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    query: web::Query<SignupQuery>,
    form: Option<web::Form<SignupForm>>,
) -> Result<HttpResponse> {
    let outcome = controller(&state)
        .signup(
            &mut ctx,
            query.into_inner().aff,
            form.map(web::Form::into_inner),
        )
        .await?;
    ctx.respond(outcome, &state.sessions).await
}

pub async fn request_password_reset(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    form: Option<web::Form<PasswordResetRequestForm>>,
) -> Result<HttpResponse> {
    let outcome = controller(&state)
        .request_password_reset(&mut ctx, form.map(web::Form::into_inner))
        .await?;
    ctx.respond(outcome, &state.sessions).await
}

pub async fn reset_password(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    query: web::Query<TokenQuery>,
    form: Option<web::Form<ResetPasswordInput>>,
) -> Result<HttpResponse> {
    let outcome = controller(&state)
        .reset_password(
            &mut ctx,
            query.token.as_deref(),
            form.map(web::Form::into_inner),
        )
        .await?;
    ctx.respond(outcome, &state.sessions).await
}

pub async fn verify_email(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    query: web::Query<TokenQuery>,
) -> Result<HttpResponse> {
    let outcome = controller(&state)
        .verify_email(&mut ctx, query.token.as_deref())
        .await?;
    ctx.respond(outcome, &state.sessions).await
}

pub async fn resend_verification_email(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    form: Option<web::Form<ResendVerificationEmailForm>>,
) -> Result<HttpResponse> {
    let outcome = controller(&state)
        .resend_verification_email(&mut ctx, form.map(web::Form::into_inner))
        .await?;
    ctx.respond(outcome, &state.sessions).await
}

/// Fallback for unknown routes, rendered by the error view.
pub async fn not_found() -> Result<HttpResponse> {
    Err(AppError::NotFound)
}

/// The error page opened directly has no failure to show.
pub async fn error() -> Result<HttpResponse> {
    Err(AppError::NotFound)
}
