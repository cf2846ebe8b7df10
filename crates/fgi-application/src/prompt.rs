//! Prompt composition.
//!
//! Pure functions that turn session state into generation requests. Nothing
//! here performs I/O; the composed request is handed to the generation
//! backend by the orchestrator.

use fgi_core::error::{FgiError, Result};
use fgi_core::persona::Persona;
use fgi_core::progress::Progress;
use fgi_core::session::SessionConfig;
use fgi_core::transcript::{SpeechRecord, StrategyExchange, StrategyLog, Transcript};
use fgi_interaction::{ChatMessage, GenerationRequest, ModelTier};

const EMPATHETIC_DIRECTIVE: &str = "Style: lead with warmth. Build rapport through everyday \
conversation, show empathy before probing, and keep the pressure low. Let participants wander a \
little before steering back.";

const BALANCED_DIRECTIVE: &str = "Style: balanced moderation. For every topic, explicitly ask for \
both positive and negative reactions, and make sure quieter participants are invited to disagree \
with the group.";

const ADVERSARIAL_DIRECTIVE: &str = "Style: adversarial probing. Challenge comfortable answers. \
Whenever a participant expresses a positive sentiment, demand a concrete justification (price \
paid, time spent, alternative rejected) before accepting it.";

/// Maps the moderator style level (1..=5) to a behavioral directive.
///
/// Single policy point for the threshold so moderator-turn and
/// stimulus-turn prompts can never drift apart: 1-2 empathetic, 3
/// balanced, 4-5 adversarial.
pub fn style_directive(level: u8) -> &'static str {
    if level <= 2 {
        EMPATHETIC_DIRECTIVE
    } else if level >= 4 {
        ADVERSARIAL_DIRECTIVE
    } else {
        BALANCED_DIRECTIVE
    }
}

/// Renders the persona roster as a bullet list for role framing.
fn render_roster(personas: &[Persona]) -> String {
    personas
        .iter()
        .map(|p| format!("- {}: {}", p.name, p.profile))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Composes the next ordinary moderator turn.
///
/// The instruction carries the topic, pacing (elapsed/target minutes and
/// stage), style directive, the full roster and any strategy-phase
/// guidance; the user turn carries the recent transcript window with a
/// directive to produce exactly one next contribution.
pub fn compose_moderator_turn(
    config: &SessionConfig,
    strategy_log: &[StrategyExchange],
    progress: Progress,
    personas: &[Persona],
    window: &[SpeechRecord],
) -> GenerationRequest {
    let mut instruction = format!(
        "You are a seasoned focus group interview (FGI) moderator.\n\n\
         ## Goal\n\
         Draw out honest opinions and unconscious insights from the participants on the topic \
         \"{topic}\".\n\n\
         ## Pacing\n\
         {elapsed} of {target} planned minutes have elapsed ({percent}%). Current stage: {stage}.\n\n\
         ## Conduct\n\
         1. Do not jump straight to the core insight; follow the current stage.\n\
         2. Spread questions across the whole panel, and dig into specific answers when they hint \
         at something deeper.\n\
         3. {style}\n\
         4. Keep each contribution short and always end with a question or prompt to the group.\n\n\
         ## Participants\n\
         {roster}",
        topic = config.topic,
        elapsed = progress.elapsed_minutes,
        target = config.target_duration_minutes,
        percent = progress.percent,
        stage = progress.stage.label(),
        style = style_directive(config.style_level),
        roster = render_roster(personas),
    );

    if !strategy_log.is_empty() {
        instruction.push_str(&format!(
            "\n\n## Session strategy agreed before the interview\n{}",
            StrategyLog::render_log(strategy_log)
        ));
    }

    let user = format!(
        "Conversation so far:\n{history}\n\n\
         Given the flow of the conversation, produce your next single contribution as the \
         moderator.",
        history = Transcript::render_log(window),
    );

    GenerationRequest::new(instruction, vec![ChatMessage::user(user)], ModelTier::Capable)
}

/// Composes a moderator stimulus-presentation turn.
///
/// # Errors
///
/// Returns `FgiError::Validation` when `stimulus_content` is empty; the
/// caller must reject the command before any generation call is made.
pub fn compose_stimulus_turn(
    config: &SessionConfig,
    stimulus_type: &str,
    stimulus_content: &str,
    personas: &[Persona],
) -> Result<GenerationRequest> {
    if stimulus_content.trim().is_empty() {
        return Err(FgiError::validation("stimulus content must not be empty"));
    }
    let stimulus_type = if stimulus_type.trim().is_empty() {
        "concept"
    } else {
        stimulus_type.trim()
    };

    let instruction = format!(
        "You are a seasoned focus group interview (FGI) moderator running a session on \
         \"{topic}\".\n\n\
         {style}\n\n\
         ## Participants\n\
         {roster}",
        topic = config.topic,
        style = style_directive(config.style_level),
        roster = render_roster(personas),
    );

    let user = format!(
        "You will now present stimulus material of type \"{stimulus_type}\" to the group:\n\n\
         {content}\n\n\
         Produce one moderator contribution that does all of the following, in order:\n\
         (a) a transition sentence introducing the stimulus,\n\
         (b) a plain-language description of the material,\n\
         (c) an explicit invitation for critical and negative reactions, not just praise,\n\
         (d) a closing question to the group.",
        content = stimulus_content.trim(),
    );

    Ok(GenerationRequest::new(
        instruction,
        vec![ChatMessage::user(user)],
        ModelTier::Capable,
    ))
}

/// Composes one participant reply.
///
/// Identity is fixed to the named persona, and the realism directive keeps
/// generated replies from collapsing into polite agreement.
pub fn compose_participant_turn(
    persona: &Persona,
    topic: &str,
    window: &[SpeechRecord],
) -> GenerationRequest {
    let instruction = format!(
        "Become the following person completely.\n\n\
         Name: {name}\n\
         Background: {profile}\n\n\
         You are taking part in a group interview on the topic \"{topic}\".\n\n\
         ## Behavior\n\
         1. Speak in a natural voice consistent with your age, family situation, worries and joys.\n\
         2. Answer the moderator's latest question.\n\
         3. Do not default to agreement. Before expressing approval, weigh what your background \
         implies about cost and lifestyle fit; if it does not fit, say so.\n\
         4. You may openly contradict other participants or the moderator's framing.\n\
         5. Never mention being an AI.",
        name = persona.name,
        profile = persona.profile,
    );

    let user = format!(
        "Conversation so far:\n{history}\n\n\
         Respond to the latest remarks as {name}, in one contribution.",
        history = Transcript::render_log(window),
        name = persona.name,
    );

    GenerationRequest::new(instruction, vec![ChatMessage::user(user)], ModelTier::Fast)
}

/// Composes the moderator acknowledgement of an operator strategy
/// instruction during the planning phase.
pub fn compose_strategy_reply(
    config: &SessionConfig,
    prior: &[StrategyExchange],
    instruction_text: &str,
) -> GenerationRequest {
    let instruction = format!(
        "You are the moderator preparing a focus group interview on \"{topic}\". The operator is \
         briefing you before the session starts. {style}\n\n\
         Acknowledge each instruction briefly, state how you will fold it into your moderation, \
         and flag anything that conflicts with earlier instructions.",
        topic = config.topic,
        style = style_directive(config.style_level),
    );

    let mut user = String::new();
    if !prior.is_empty() {
        user.push_str(&format!(
            "Briefing so far:\n{}\n\n",
            StrategyLog::render_log(prior)
        ));
    }
    user.push_str(&format!("New instruction from the operator:\n{instruction_text}"));

    GenerationRequest::new(instruction, vec![ChatMessage::user(user)], ModelTier::Capable)
}

/// Composes the end-of-session insight analysis request over the full
/// interview transcript, roster and strategy briefing.
pub fn compose_analysis(
    config: &SessionConfig,
    personas: &[Persona],
    interview: &[SpeechRecord],
    strategy: &[StrategyExchange],
) -> GenerationRequest {
    let mut instruction = format!(
        "You are an excellent marketing researcher. Read the following FGI transcript and \
         analyze it.\n\n\
         Topic: {topic}\n\n\
         ## Items to analyze\n\
         1. Pains and problems the participants share\n\
         2. Gains and value the participants perceive\n\
         3. Psychological drivers and insights behind the statements\n\
         4. Implications for future marketing\n\n\
         ## Participants\n\
         {roster}\n\n\
         ## Transcript\n\
         {transcript}",
        topic = config.topic,
        roster = render_roster(personas),
        transcript = Transcript::render_log(interview),
    );

    if !strategy.is_empty() {
        instruction.push_str(&format!(
            "\n\n## Pre-session briefing\n{}",
            StrategyLog::render_log(strategy)
        ));
    }

    GenerationRequest::new(
        instruction,
        vec![ChatMessage::user("Please provide the analysis.")],
        ModelTier::Capable,
    )
}
