//! Built-in note templates and their instantiation into notes.
//!
//! Template bodies are written in a small markdown dialect and turned into
//! editor HTML by [`TEMPLATE_RULES`]. Each list line becomes its own
//! `<ul><li>` pair; adjacent items are not merged into one list.

use std::{fmt, sync::LazyLock};

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info};

use crate::{apply_rules, calendar_date, generate_note_id, Note, NotesError, Result, Rule};

/// An immutable catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub tags: &'static [&'static str],
    /// Body with `{{date}}`, `{{time}}`, `{{title}}` and `{{attendees}}` placeholders
    pub content: &'static str,
    /// Instantiated notes carry an (initially empty) attendee list
    pub attendees_required: bool,
    /// Instantiated notes carry the current time as meeting time
    pub time_required: bool,
}

/// Markdown-to-HTML substitutions applied to template bodies, in order.
pub static TEMPLATE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new("h1", r"(?m)^# (.*)$", "<h1>${1}</h1>"),
        Rule::new("h2", r"(?m)^## (.*)$", "<h2>${1}</h2>"),
        Rule::new("h3", r"(?m)^### (.*)$", "<h3>${1}</h3>"),
        Rule::new("unchecked", r"(?m)^- \[ \] (.*)$", "<ul><li>${1}</li></ul>"),
        Rule::new(
            "checked",
            r"(?m)^- \[x\] (.*)$",
            "<ul><li><strike>${1}</strike></li></ul>",
        ),
        Rule::new("bullet", r"(?m)^- (.*)$", "<ul><li>${1}</li></ul>"),
        Rule::new("bold", r"\*\*(.*?)\*\*", "<strong>${1}</strong>"),
        Rule::new("italic", r"\*(.*?)\*", "<em>${1}</em>"),
        Rule::new("newline", r"\n", "<br>"),
    ]
});

static CATALOG: [NoteTemplate; 8] = [
    NoteTemplate {
        id: "team-standup",
        name: "Team Standup",
        description: "Daily team standup meeting template",
        category: "meeting",
        tags: &["standup", "daily", "team"],
        attendees_required: true,
        time_required: true,
        content: "# Team Standup - {{date}}\n\
\n\
## Attendees\n\
{{attendees}}\n\
\n\
## What did we accomplish yesterday?\n\
\n\
\n\
## What are we working on today?\n\
\n\
\n\
## Blockers/Impediments\n\
\n\
\n\
## Action Items\n\
- [ ] \n\
- [ ] \n\
\n\
## Notes\n\
\n",
    },
    NoteTemplate {
        id: "project-planning",
        name: "Project Planning",
        description: "Template for project planning meetings",
        category: "project",
        tags: &["planning", "project", "roadmap"],
        attendees_required: true,
        time_required: true,
        content: "# Project Planning Meeting - {{date}}\n\
\n\
## Attendees\n\
{{attendees}}\n\
\n\
## Project Overview\n\
**Project Name:**\n\
**Duration:**\n\
**Priority:**\n\
\n\
## Objectives\n\
1. \n\
2. \n\
3. \n\
\n\
## Success Criteria\n\
\n\
\n\
## Timeline & Milestones\n\
| Milestone | Date | Owner |\n\
|-----------|------|-------|\n\
|           |      |       |\n\
\n\
## Resources Required\n\
\n\
\n\
## Risks & Mitigation\n\
\n\
\n\
## Action Items\n\
- [ ] \n\
- [ ] \n\
\n\
## Next Steps\n\
\n",
    },
    NoteTemplate {
        id: "retrospective",
        name: "Retrospective",
        description: "Sprint or project retrospective template",
        category: "meeting",
        tags: &["retrospective", "improvement", "team"],
        attendees_required: true,
        time_required: false,
        content: "# Retrospective - {{date}}\n\
\n\
## Attendees\n\
{{attendees}}\n\
\n\
## What went well? 😊\n\
- \n\
- \n\
\n\
## What could be improved? 🤔\n\
- \n\
- \n\
\n\
## What should we start doing? ✨\n\
- \n\
- \n\
\n\
## What should we stop doing? 🛑\n\
- \n\
- \n\
\n\
## Action Items\n\
- [ ] \n\
- [ ] \n\
\n\
## Team Mood\n\
Rating: __ / 10\n\
\n\
## Notes\n\
\n",
    },
    NoteTemplate {
        id: "one-on-one",
        name: "One-on-One",
        description: "Template for one-on-one meetings",
        category: "meeting",
        tags: &["1:1", "feedback", "personal"],
        attendees_required: true,
        time_required: false,
        content: "# One-on-One Meeting - {{date}}\n\
\n\
## Participants\n\
{{attendees}}\n\
\n\
## Agenda\n\
1. How are things going?\n\
2. Recent wins and challenges\n\
3. Goals and priorities\n\
4. Feedback and support needed\n\
5. Career development\n\
\n\
## Discussion Points\n\
\n\
### Recent Work\n\
- What's going well?\n\
- What's challenging?\n\
\n\
### Goals & Priorities\n\
- Progress on current goals\n\
- Upcoming priorities\n\
\n\
### Feedback\n\
- What support do you need?\n\
- Any blockers I can help with?\n\
\n\
### Growth & Development\n\
- Learning opportunities\n\
- Skill development interests\n\
\n\
## Action Items\n\
- [ ] \n\
- [ ] \n\
\n\
## Notes\n\
\n",
    },
    NoteTemplate {
        id: "brainstorming",
        name: "Brainstorming Session",
        description: "Creative brainstorming and ideation session",
        category: "ideas",
        tags: &["brainstorming", "creativity", "ideas"],
        attendees_required: true,
        time_required: false,
        content: "# Brainstorming Session - {{date}}\n\
\n\
## Attendees\n\
{{attendees}}\n\
\n\
## Challenge/Problem Statement\n\
\n\
\n\
## Ground Rules\n\
- No judgment\n\
- Build on ideas\n\
- Stay focused\n\
- Encourage wild ideas\n\
\n\
## Ideas Generated\n\
\n\
### Idea 1\n\
**Description:**\n\
**Pros:**\n\
**Cons:**\n\
**Effort:** Low/Medium/High\n\
\n\
### Idea 2\n\
**Description:**\n\
**Pros:**\n\
**Cons:**\n\
**Effort:** Low/Medium/High\n\
\n\
### Idea 3\n\
**Description:**\n\
**Pros:**\n\
**Cons:**\n\
**Effort:** Low/Medium/High\n\
\n\
## Prioritization\n\
1. \n\
2. \n\
3. \n\
\n\
## Next Steps\n\
- [ ] \n\
- [ ] \n\
\n\
## Notes\n\
\n",
    },
    NoteTemplate {
        id: "client-meeting",
        name: "Client Meeting",
        description: "Template for client meetings and check-ins",
        category: "meeting",
        tags: &["client", "business", "external"],
        attendees_required: true,
        time_required: true,
        content: "# Client Meeting - {{date}}\n\
\n\
## Attendees\n\
{{attendees}}\n\
\n\
## Meeting Objective\n\
\n\
\n\
## Agenda\n\
1. Welcome and introductions\n\
2. Project status update\n\
3. Discussion points\n\
4. Q&A\n\
5. Next steps\n\
\n\
## Project Status\n\
**Current Phase:**\n\
**Progress:**\n\
**Timeline:**\n\
\n\
## Discussion Points\n\
\n\
\n\
## Client Feedback\n\
\n\
\n\
## Decisions Made\n\
\n\
\n\
## Action Items\n\
- [ ] \n\
- [ ] \n\
\n\
## Next Meeting\n\
**Date:**\n\
**Agenda:**\n\
\n\
## Notes\n\
\n",
    },
    NoteTemplate {
        id: "action-items",
        name: "Action Items",
        description: "Simple action items and task tracking",
        category: "action-items",
        tags: &["tasks", "todo", "tracking"],
        attendees_required: false,
        time_required: false,
        content: "# Action Items - {{date}}\n\
\n\
## High Priority\n\
- [ ] \n\
- [ ] \n\
- [ ] \n\
\n\
## Medium Priority\n\
- [ ] \n\
- [ ] \n\
\n\
## Low Priority\n\
- [ ] \n\
- [ ] \n\
\n\
## Completed\n\
- [x] \n\
\n\
## Notes\n\
\n",
    },
    NoteTemplate {
        id: "general-notes",
        name: "General Notes",
        description: "Simple general-purpose note template",
        category: "general",
        tags: &["general", "notes"],
        attendees_required: false,
        time_required: false,
        content: "# {{title}} - {{date}}\n\
\n\
## Summary\n\
\n\
\n\
## Key Points\n\
- \n\
- \n\
- \n\
\n\
## Action Items\n\
- [ ] \n\
- [ ] \n\
\n\
## Notes\n\
\n",
    },
];

/// The compiled-in templates, in display order.
pub fn catalog() -> &'static [NoteTemplate] {
    &CATALOG
}

pub fn find_template(id: &str) -> Result<&'static NoteTemplate> {
    CATALOG
        .iter()
        .find(|template| template.id == id)
        .ok_or_else(|| NotesError::TemplateNotFound { id: id.to_string() })
}

/// Distinct template categories in catalog order.
pub fn template_categories() -> Vec<&'static str> {
    let mut categories = Vec::new();
    for template in &CATALOG {
        if !categories.contains(&template.category) {
            categories.push(template.category);
        }
    }
    categories
}

/// Formats a time the way the editor displays meeting times, e.g. `09:05 AM`.
pub fn format_meeting_time<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    now.format("%I:%M %p").to_string()
}

impl NoteTemplate {
    /// Substitutes placeholders and converts the body to editor HTML.
    ///
    /// `{{date}}` is the UTC calendar date; `{{time}}` is the wall-clock time
    /// in the zone of `now`.
    pub fn render<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: fmt::Display,
    {
        let date = calendar_date(now).format("%Y-%m-%d").to_string();
        let body = self
            .content
            .replace("{{date}}", &date)
            .replace("{{time}}", &format_meeting_time(now))
            .replace("{{title}}", self.name)
            .replace("{{attendees}}", "");
        apply_rules(&TEMPLATE_RULES, &body)
    }

    /// Builds a new, unsaved note from this template.
    ///
    /// The attendee list is present but empty when the template asks for
    /// attendees; saving the note through the store collapses it to `None`
    /// unless attendees were added.
    pub fn instantiate<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Note
    where
        Tz::Offset: fmt::Display,
    {
        info!("Instantiating template: {}", self.id);
        let created = now.with_timezone(&Utc);
        let content = self.render(now);
        debug!("Template {} rendered to {} bytes", self.id, content.len());

        Note {
            id: generate_note_id(created),
            title: self.name.to_string(),
            content,
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
            category: self.category.to_string(),
            date: calendar_date(now),
            attendees: self.attendees_required.then(Vec::new),
            meeting_time: self.time_required.then(|| format_meeting_time(now)),
            created_at: created,
            updated_at: created,
        }
    }
}
