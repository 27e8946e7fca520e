// src/models/mod.rs
pub mod aluno;
pub mod aula;
pub mod document;
pub mod escola;
pub mod invite;
pub mod presenca;
pub mod turma;
pub mod user;
