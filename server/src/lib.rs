// Life of a login:
// 1. HTTP request comes in (http)
// 2. Credentials are validated and the email normalized
// 3. The account is looked up in the store and the password verified
// 4. A signed bearer token is issued
//
// Life of a protected request:
// 1. The bearer token is pulled from the Authorization header
// 2. The token is verified statelessly (signature + expiry)
// 3. The identity claim is attached to the request
//
// System components:
//  - Password hasher (bcrypt)
//  - Token service (HS256 JWT)
//  - Account store contract + in-memory store
//  - Provisioner for well-known accounts

pub mod auth;
pub mod config;
pub mod http;
pub mod time;
pub mod types;
